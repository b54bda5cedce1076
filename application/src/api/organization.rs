//! [`Organization`]-related definitions.

use std::future;

use common::{Currency, DateTime};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// An organization the [`api::User`]s work in.
#[derive(Clone, Debug)]
pub struct Organization {
    /// ID of this [`Organization`].
    id: Id,

    /// Underlying [`domain::Organization`].
    organization: OnceCell<domain::Organization>,
}

impl From<domain::Organization> for Organization {
    fn from(organization: domain::Organization) -> Self {
        Self {
            id: organization.id.into(),
            organization: OnceCell::new_with(Some(organization)),
        }
    }
}

impl Organization {
    /// Creates a new [`Organization`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Organization`] with the provided ID exists,
    /// otherwise accessing this [`Organization`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            organization: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Organization`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Organization`] doesn't exist.
    async fn organization(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Organization, Error> {
        let id = self.id.into();
        self.organization
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::organization::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|o| {
                        future::ready(o.ok_or_else(|| {
                            api::query::OrganizationError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// An organization the `User`s work in.
#[graphql_object(context = Context)]
impl Organization {
    /// Unique identifier of this `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Organization.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Organization.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.organization(ctx).await?.name.clone().into())
    }

    /// Working `Currency` of this `Organization`.
    ///
    /// Deal values are denominated and sales are reported in it.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Organization.currency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn currency(&self, ctx: &Context) -> Result<Currency, Error> {
        Ok(self.organization(ctx).await?.currency)
    }

    /// `DateTime` when this `Organization` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Organization.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.organization(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of an `Organization`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::organization::Id)]
#[into(domain::organization::Id)]
#[graphql(name = "OrganizationId", transparent)]
pub struct Id(Uuid);

/// Name of an `Organization`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "OrganizationName",
    with = scalar::Via::<domain::organization::Name>,
)]
pub struct Name(domain::organization::Name);
