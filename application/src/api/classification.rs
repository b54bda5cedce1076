//! [`WorkType`]- and [`SourceType`]-related definitions.

use derive_more::{AsRef, Display, From, Into};
use juniper::GraphQLScalar;
use service::domain;

use crate::api::scalar;

/// Defines a GraphQL object of a classification, lazily loaded by its ID.
macro_rules! define_classification {
    (
        $(#[doc = $doc:literal])*
        $name:ident, $module:ident, $query:ident,
        $id_name:literal, $error:ident $(,)?
    ) => {
        pub mod $module {
            #![doc = concat!(
                "[`", stringify!($name), "`]-related definitions."
            )]

            use common::DateTime;
            use derive_more::{Display, From, Into};
            use futures::{future, TryFutureExt as _};
            use juniper::{graphql_object, GraphQLScalar};
            use service::{domain, query, Query as _};
            use tokio::sync::OnceCell;
            use uuid::Uuid;

            use crate::{api, AsError, Context, Error};

            $(#[doc = $doc])*
            #[derive(Clone, Debug)]
            pub struct $name {
                /// ID of this classification.
                id: Id,

                /// Underlying domain entity.
                entity: OnceCell<domain::$name>,
            }

            impl From<domain::$name> for $name {
                fn from(entity: domain::$name) -> Self {
                    Self {
                        id: entity.id.into(),
                        entity: OnceCell::new_with(Some(entity)),
                    }
                }
            }

            impl $name {
                /// Creates a new classification with the provided ID.
                ///
                /// # Safety
                ///
                /// Caller must ensure that the classification with the
                /// provided ID exists, otherwise accessing it will result
                /// with an error.
                #[expect(unsafe_code, reason = "bypass")]
                #[must_use]
                pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
                    Self {
                        id: id.into(),
                        entity: OnceCell::new(),
                    }
                }

                /// Returns the underlying domain entity.
                async fn entity(
                    &self,
                    ctx: &Context,
                ) -> Result<&domain::$name, Error> {
                    let id = self.id.into();
                    self.entity
                        .get_or_try_init(|| {
                            ctx.service()
                                .execute(query::$query::ById::by(id))
                                .map_err(AsError::into_error)
                                .map_err(ctx.error())
                                .and_then(|e| {
                                    future::ready(e.ok_or_else(|| {
                                        api::query::$error::NotExists.into()
                                    }))
                                })
                        })
                        .await
                }
            }

            $(#[doc = $doc])*
            #[graphql_object(context = Context)]
            impl $name {
                /// Unique identifier of this classification.
                #[tracing::instrument(
                    skip_all,
                    fields(
                        gql.name = concat!(stringify!($name), ".id"),
                        otel.name = api::Query::SPAN_NAME,
                    ),
                )]
                pub fn id(&self) -> Id {
                    self.id
                }

                /// Name of this classification, unique within its
                /// `Organization`.
                #[tracing::instrument(
                    skip_all,
                    fields(
                        gql.name = concat!(stringify!($name), ".name"),
                        otel.name = api::Query::SPAN_NAME,
                    ),
                )]
                pub async fn name(
                    &self,
                    ctx: &Context,
                ) -> Result<api::classification::Name, Error> {
                    Ok(self.entity(ctx).await?.name.clone().into())
                }

                /// `DateTime` when this classification was created.
                #[tracing::instrument(
                    skip_all,
                    fields(
                        gql.name = concat!(stringify!($name), ".createdAt"),
                        otel.name = api::Query::SPAN_NAME,
                    ),
                )]
                pub async fn created_at(
                    &self,
                    ctx: &Context,
                ) -> Result<DateTime, Error> {
                    Ok(self.entity(ctx).await?.created_at.coerce())
                }
            }

            /// Unique identifier of a classification.
            #[derive(
                Clone,
                Copy,
                Debug,
                Display,
                Eq,
                From,
                GraphQLScalar,
                Into,
                PartialEq,
            )]
            #[from(domain::classification::$module::Id)]
            #[into(domain::classification::$module::Id)]
            #[graphql(name = $id_name, transparent)]
            pub struct Id(Uuid);
        }
    };
}

define_classification! {
    /// Kind of work a `Deal` is about.
    WorkType, work_type, work_types, "WorkTypeId", WorkTypeError
}

define_classification! {
    /// Channel a `Deal` came from.
    SourceType, source_type, source_types, "SourceTypeId", SourceTypeError
}

/// Name of a `WorkType` or a `SourceType`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "ClassificationName",
    with = scalar::Via::<domain::classification::Name>,
)]
pub struct Name(domain::classification::Name);

#[cfg(test)]
mod spec {
    #[test]
    fn registers_own_id_scalar_per_classification() {
        let schema = crate::schema();
        for name in ["WorkTypeId", "SourceTypeId"] {
            let ty = schema.schema.concrete_type_by_name(name).unwrap();
            assert_eq!(
                ty.description().map(str::trim),
                Some("Unique identifier of a classification."),
            );
        }
    }
}
