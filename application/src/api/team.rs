//! [`Team`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A team of [`api::User`]s.
#[derive(Clone, Debug)]
pub struct Team {
    /// ID of this [`Team`].
    id: Id,

    /// Underlying [`domain::Team`].
    team: OnceCell<domain::Team>,
}

impl From<domain::Team> for Team {
    fn from(team: domain::Team) -> Self {
        Self {
            id: team.id.into(),
            team: OnceCell::new_with(Some(team)),
        }
    }
}

impl Team {
    /// Creates a new [`Team`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Team`] with the provided ID exists,
    /// otherwise accessing this [`Team`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            team: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Team`].
    async fn team(&self, ctx: &Context) -> Result<&domain::Team, Error> {
        let id = self.id.into();
        self.team
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::team::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|t| {
                        future::ready(t.ok_or_else(|| {
                            api::query::TeamError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A team of `User`s.
#[graphql_object(context = Context)]
impl Team {
    /// Unique identifier of this `Team`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Team.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `Team`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Team.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.team(ctx).await?.name.clone().into())
    }

    /// `User`s being members of this `Team`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Team.members",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn members(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::User>, Error> {
        let team = self.team(ctx).await?;
        Ok(ctx
            .service()
            .execute(query::users::ByOrganization::by(team.organization_id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .filter(|u| u.team_id == Some(team.id))
            .map(Into::into)
            .collect())
    }

    /// `DateTime` when this `Team` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Team.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.team(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Team`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::team::Id)]
#[into(domain::team::Id)]
#[graphql(name = "TeamId", transparent)]
pub struct Id(Uuid);

/// Name of a `Team`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "TeamName",
    with = scalar::Via::<domain::team::Name>,
)]
pub struct Name(domain::team::Name);
