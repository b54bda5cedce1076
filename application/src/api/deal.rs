//! [`Deal`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLScalar};
use rust_decimal::Decimal;
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A sales deal made by an [`api::User`].
#[derive(Clone, Debug)]
pub struct Deal {
    /// ID of this [`Deal`].
    id: Id,

    /// Underlying [`domain::Deal`].
    deal: OnceCell<domain::Deal>,
}

impl From<domain::Deal> for Deal {
    fn from(deal: domain::Deal) -> Self {
        Self {
            id: deal.id.into(),
            deal: OnceCell::new_with(Some(deal)),
        }
    }
}

impl Deal {
    /// Creates a new [`Deal`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Deal`] with the provided ID exists,
    /// otherwise accessing this [`Deal`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            deal: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Deal`].
    async fn deal(&self, ctx: &Context) -> Result<&domain::Deal, Error> {
        let id = self.id.into();
        self.deal
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::deal::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|d| {
                        future::ready(d.ok_or_else(|| {
                            api::query::DealError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Returns all the [`domain::Payment`]s of this [`Deal`].
    async fn payments_of(
        &self,
        ctx: &Context,
    ) -> Result<Vec<domain::Payment>, Error> {
        ctx.service()
            .execute(query::payments::ByDeal::by(self.id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
    }
}

/// A sales deal made by a `User`.
#[graphql_object(context = Context)]
impl Deal {
    /// Unique identifier of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `User` who made this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.owner",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn owner(&self, ctx: &Context) -> Result<api::User, Error> {
        let id = self.deal(ctx).await?.user_id;
        #[expect(
            unsafe_code,
            reason = "`Deal` loaded from repository guarantees `User` \
                      existence"
        )]
        let user = unsafe { api::User::new_unchecked(id) };
        Ok(user)
    }

    /// Client this `Deal` was made with.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.client",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn client(&self, ctx: &Context) -> Result<Client, Error> {
        Ok(self.deal(ctx).await?.client.clone().into())
    }

    /// `WorkType` of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.workType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn work_type(
        &self,
        ctx: &Context,
    ) -> Result<api::WorkType, Error> {
        let id = self.deal(ctx).await?.work_type_id;
        #[expect(
            unsafe_code,
            reason = "`Deal` loaded from repository guarantees `WorkType` \
                      existence"
        )]
        let work_type = unsafe { api::WorkType::new_unchecked(id) };
        Ok(work_type)
    }

    /// `SourceType` of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.sourceType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn source_type(
        &self,
        ctx: &Context,
    ) -> Result<api::SourceType, Error> {
        let id = self.deal(ctx).await?.source_type_id;
        #[expect(
            unsafe_code,
            reason = "`Deal` loaded from repository guarantees `SourceType` \
                      existence"
        )]
        let source_type = unsafe { api::SourceType::new_unchecked(id) };
        Ok(source_type)
    }

    /// Value of this `Deal` in the `Organization` currency.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.value",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn value(&self, ctx: &Context) -> Result<Value, Error> {
        Ok(self.deal(ctx).await?.value.into())
    }

    /// Sum of the verified `Payment`s of this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.paid",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn paid(&self, ctx: &Context) -> Result<scalar::Decimal, Error> {
        Ok(self
            .payments_of(ctx)
            .await?
            .iter()
            .filter(|p| p.is_verified())
            .map(|p| p.amount.value())
            .sum::<Decimal>()
            .into())
    }

    /// `DateTime` when this `Deal` was concluded.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.dealDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deal_date(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.deal(ctx).await?.deal_date.coerce())
    }

    /// `DateTime` when this `Deal` is expected to be paid in full, if set.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.dueDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn due_date(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.deal(ctx).await?.due_date.map(|d| d.coerce()))
    }

    /// Free-form remarks about this `Deal`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.remarks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn remarks(
        &self,
        ctx: &Context,
    ) -> Result<Option<Remarks>, Error> {
        Ok(self.deal(ctx).await?.remarks.clone().map(Into::into))
    }

    /// Indicator whether this `Deal` was edited after its creation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.isEdited",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_edited(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.deal(ctx).await?.is_edited)
    }

    /// `Payment`s made against this `Deal`, in the order of their dates.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.payments",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        Ok(self
            .payments_of(ctx)
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// `DateTime` when this `Deal` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Deal.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.deal(ctx).await?.created_at.coerce())
    }
}

/// Unique identifier of a `Deal`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::deal::Id)]
#[into(domain::deal::Id)]
#[graphql(name = "DealId", transparent)]
pub struct Id(Uuid);

/// Name of a `Deal`'s client.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealClient",
    with = scalar::Via::<domain::deal::Client>,
)]
pub struct Client(domain::deal::Client);

/// Non-negative value of a `Deal`, as a decimal string (`"1500.00"`).
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealValue",
    with = scalar::Via::<domain::deal::Value>,
)]
pub struct Value(domain::deal::Value);

/// Free-form remarks about a `Deal`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "DealRemarks",
    with = scalar::Via::<domain::deal::Remarks>,
)]
pub struct Remarks(domain::deal::Remarks);
