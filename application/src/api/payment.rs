//! [`Payment`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::{future, TryFutureExt as _};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A payment received against an [`api::Deal`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    id: Id,

    /// Underlying [`domain::Payment`].
    payment: OnceCell<domain::Payment>,
}

impl From<domain::Payment> for Payment {
    fn from(payment: domain::Payment) -> Self {
        Self {
            id: payment.id.into(),
            payment: OnceCell::new_with(Some(payment)),
        }
    }
}

impl Payment {
    /// Returns the underlying [`domain::Payment`].
    async fn payment(&self, ctx: &Context) -> Result<&domain::Payment, Error> {
        let id = self.id.into();
        self.payment
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::payment::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|p| {
                        future::ready(p.ok_or_else(|| {
                            api::query::PaymentError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A payment received against a `Deal`.
#[graphql_object(context = Context)]
impl Payment {
    /// Unique identifier of this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Deal` this `Payment` is made against.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.deal",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn deal(&self, ctx: &Context) -> Result<api::Deal, Error> {
        let id = self.payment(ctx).await?.deal_id;
        #[expect(
            unsafe_code,
            reason = "`Payment` loaded from repository guarantees `Deal` \
                      existence"
        )]
        let deal = unsafe { api::Deal::new_unchecked(id) };
        Ok(deal)
    }

    /// Received amount of this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.amount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn amount(&self, ctx: &Context) -> Result<Amount, Error> {
        Ok(self.payment(ctx).await?.amount.into())
    }

    /// `DateTime` when this `Payment` was received.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.paymentDate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn payment_date(
        &self,
        ctx: &Context,
    ) -> Result<DateTime, Error> {
        Ok(self.payment(ctx).await?.payment_date.coerce())
    }

    /// Reference to the receipt of this `Payment`, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.receipt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn receipt(
        &self,
        ctx: &Context,
    ) -> Result<Option<Receipt>, Error> {
        Ok(self.payment(ctx).await?.receipt.clone().map(Into::into))
    }

    /// Free-form remarks about this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.remarks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn remarks(
        &self,
        ctx: &Context,
    ) -> Result<Option<Remarks>, Error> {
        Ok(self.payment(ctx).await?.remarks.clone().map(Into::into))
    }

    /// Review status of this `Payment`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.payment(ctx).await?.status.kind().into())
    }

    /// `User` who reviewed this `Payment`, if it was reviewed.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.reviewedBy",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviewed_by(
        &self,
        ctx: &Context,
    ) -> Result<Option<api::User>, Error> {
        Ok(self.payment(ctx).await?.status.reviewed_by().map(|id| {
            #[expect(
                unsafe_code,
                reason = "reviewing `User`s are never deleted physically"
            )]
            unsafe {
                api::User::new_unchecked(id)
            }
        }))
    }

    /// `DateTime` when this `Payment` was reviewed, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.reviewedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn reviewed_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self
            .payment(ctx)
            .await?
            .status
            .reviewed_at()
            .map(|at| at.coerce()))
    }

    /// Reason of the denial, if this `Payment` was denied.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.denialRemarks",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn denial_remarks(
        &self,
        ctx: &Context,
    ) -> Result<Option<Remarks>, Error> {
        Ok(self
            .payment(ctx)
            .await?
            .status
            .denial_remarks()
            .cloned()
            .map(Into::into))
    }

    /// Indicator whether this `Payment` was edited after its creation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.isEdited",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn is_edited(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.payment(ctx).await?.is_edited)
    }

    /// `DateTime` when this `Payment` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Payment.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.payment(ctx).await?.created_at.coerce())
    }
}

/// Review status of a `Payment`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentStatus")]
pub enum Status {
    /// Awaits a review.
    Pending,

    /// Confirmed as received.
    Verified,

    /// Rejected as not received.
    Denied,
}

impl From<domain::payment::StatusKind> for Status {
    fn from(kind: domain::payment::StatusKind) -> Self {
        use domain::payment::StatusKind as K;
        match kind {
            K::Pending => Self::Pending,
            K::Verified => Self::Verified,
            K::Denied => Self::Denied,
        }
    }
}

/// Unique identifier of a `Payment`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::payment::Id)]
#[into(domain::payment::Id)]
#[graphql(name = "PaymentId", transparent)]
pub struct Id(Uuid);

/// Positive amount of a `Payment`, as a decimal string (`"250.00"`).
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentAmount",
    with = scalar::Via::<domain::payment::Amount>,
)]
pub struct Amount(domain::payment::Amount);

/// Reference to a `Payment` receipt.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentReceipt",
    with = scalar::Via::<domain::payment::Receipt>,
)]
pub struct Receipt(domain::payment::Receipt);

/// Free-form remarks about a `Payment`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PaymentRemarks",
    with = scalar::Via::<domain::payment::Remarks>,
)]
pub struct Remarks(domain::payment::Remarks);
