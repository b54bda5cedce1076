//! GraphQL [`Query`]s definitions.

use common::Currency;
use juniper::graphql_object;
use service::{
    domain::period,
    query, Query as _,
};

use crate::{
    api::{self, FieldError, Failure},
    define_error, AsError, Context, Error,
};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        ctx.current_user().await.map(Into::into)
    }

    /// Returns the `Organization` of the currently authenticated `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myOrganization",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_organization(
        ctx: &Context,
    ) -> Result<api::Organization, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::organization::ById::by(org_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| OrganizationError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `User` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `USER_NOT_EXISTS` - the `User` with the specified ID does not exist
    ///                       within the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "user",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<api::User, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::user::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|u| org_id == u.organization_id.into())
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `User`s of the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "users",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn users(ctx: &Context) -> Result<Vec<api::User>, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::users::ByOrganization::by(org_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|users| users.into_iter().map(Into::into).collect())
    }

    /// Returns the `Team` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `TEAM_NOT_EXISTS` - the `Team` with the specified ID does not exist
    ///                       within the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "team",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn team(
        id: api::team::Id,
        ctx: &Context,
    ) -> Result<api::Team, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::team::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|t| org_id == t.organization_id.into())
            .ok_or_else(|| TeamError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists all the `Team`s of the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "teams",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn teams(ctx: &Context) -> Result<Vec<api::Team>, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::teams::ByOrganization::by(org_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|teams| teams.into_iter().map(Into::into).collect())
    }

    /// Lists all the `WorkType`s of the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "workTypes",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn work_types(
        ctx: &Context,
    ) -> Result<Vec<api::WorkType>, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::work_types::ByOrganization::by(org_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|types| types.into_iter().map(Into::into).collect())
    }

    /// Lists all the `SourceType`s of the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "sourceTypes",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn source_types(
        ctx: &Context,
    ) -> Result<Vec<api::SourceType>, Error> {
        let org_id = ctx.current_organization_id().await?;
        ctx.service()
            .execute(query::source_types::ByOrganization::by(org_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|types| types.into_iter().map(Into::into).collect())
    }

    /// Returns the `Deal` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `DEAL_NOT_EXISTS` - the `Deal` with the specified ID does not exist
    ///                       or is not accessible by the current `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "deal",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn deal(
        id: api::deal::Id,
        ctx: &Context,
    ) -> Result<api::Deal, Error> {
        let me = ctx.current_user().await?;
        ctx.service()
            .execute(query::deal::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .filter(|d| d.is_accessible_by(&me))
            .ok_or_else(|| DealError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists the `Deal`s made within the filtered period, the most recent
    /// first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `VALIDATION_ERROR` - the requested period is invalid;
    /// - `ACCESS_DENIED` - the current `User` asks for somebody else's sales
    ///                     without a privilege to do so.
    #[tracing::instrument(
        skip_all,
        fields(
            client = ?client.as_ref().map(ToString::to_string),
            gql.name = "deals",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn deals(
        filter: Option<api::report::sales::Filter>,
        client: Option<api::deal::Client>,
        ctx: &Context,
    ) -> Result<Vec<api::Deal>, Error> {
        let my_id = ctx.current_user_id().await?;
        let (period, scope) = filter
            .unwrap_or_default()
            .into_parts()
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        ctx.service()
            .execute(query::Deals {
                period,
                scope,
                client: client.map(Into::into),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|out| out.deals.into_iter().map(Into::into).collect())
    }

    /// Aggregates the sales of the current `Organization` over the filtered
    /// period.
    ///
    /// Business failures are reported as a `Failure` with one of the codes:
    /// - `VALIDATION_ERROR` - the requested period is invalid;
    /// - `ACCESS_DENIED` - the current `User` asks for somebody else's sales
    ///                     without a privilege to do so;
    /// - `TEAM_NOT_EXISTS` - the `Team` to narrow the sales to does not exist
    ///                       in the current `Organization`;
    /// - `USER_NOT_EXISTS` - the `User` to narrow the sales to does not exist
    ///                       in the current `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "salesSummary",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn sales_summary(
        filter: Option<api::report::sales::Filter>,
        ctx: &Context,
    ) -> Result<api::report::sales::Outcome, Error> {
        let my_id = ctx.current_user_id().await?;
        let (period, scope) = match filter.unwrap_or_default().into_parts() {
            Ok(parts) => parts,
            Err(e) => {
                let fields = FieldError::of_period(&e);
                return Ok(Failure::new(e.as_error(), fields).into());
            }
        };

        Ok(ctx
            .service()
            .execute(query::SalesSummary {
                period,
                scope,
                initiator_id: my_id.into(),
            })
            .await
            .map_or_else(
                |e| {
                    use query::report::sales_summary::ExecutionError as E;

                    let fields = if let E::Period(p) = e.as_ref() {
                        FieldError::of_period(p)
                    } else {
                        vec![]
                    };
                    Failure::new(e.into_error(), fields).into()
                },
                |out| api::report::SalesSummary::from(out).into(),
            ))
    }

    /// Returns the saved `CommissionRecord`s of the specified month.
    ///
    /// Salespersons see their own `CommissionRecord` only. Empty if nothing
    /// was saved for the month yet.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "commission",
            month = %month,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn commission(
        month: api::commission::Month,
        ctx: &Context,
    ) -> Result<Vec<api::Commission>, Error> {
        let my_id = ctx.current_user_id().await?;
        ctx.service()
            .execute(query::Commissions {
                month: month.into(),
                initiator_id: my_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|cs| cs.into_iter().map(Into::into).collect())
    }

    /// Computes the `CommissionRecord`s of the provided sheet without saving
    /// them.
    ///
    /// Business failures are reported as a `Failure` with one of the codes:
    /// - `VALIDATION_ERROR` - an entry of the sheet is invalid;
    /// - `NOT_PRIVILEGED` - the current `User` is neither an admin nor a
    ///                      supervisor;
    /// - `BASE_CURRENCY_MISMATCH` - the base `Currency` is not the working
    ///                              one of the `Organization`;
    /// - `DUPLICATE_ENTRY` - a `User` is listed more than once;
    /// - `USER_NOT_EXISTS` - a listed `User` is not a member of the
    ///                       `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "commissionDraft",
            month = %sheet.month,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn commission_draft(
        sheet: api::commission::Sheet,
        ctx: &Context,
    ) -> Result<api::commission::DraftOutcome, Error> {
        let my_id = ctx.current_user_id().await?;
        let (month, base_currency, entries) = match sheet.into_parts() {
            Ok(parts) => parts,
            Err(failure) => return Ok(failure.into()),
        };

        Ok(ctx
            .service()
            .execute(query::CommissionDraft {
                month,
                base_currency,
                entries,
                initiator_id: my_id.into(),
            })
            .await
            .map_or_else(
                |e| Failure::from(e.into_error()).into(),
                |out| api::commission::Draft::from(out).into(),
            ))
    }

    /// Returns the latest known exchange rates relative to the provided
    /// anchor `Currency`.
    #[tracing::instrument(
        skip_all,
        fields(
            anchor = %anchor,
            gql.name = "currencyRates",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn currency_rates(
        anchor: Currency,
        ctx: &Context,
    ) -> Result<api::currency::Rates, Error> {
        _ = ctx.current_session().await?;
        let rates = ctx
            .service()
            .execute(query::CurrencyRates { anchor })
            .await
            .unwrap_or_else(|never| match never {});
        Ok(rates.into())
    }
}

impl AsError for period::Error {
    fn try_as_error(&self) -> Option<Error> {
        Some(Error::validation(self))
    }
}

impl AsError for query::deals::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AccessDenied(_) => Some(SalesError::AccessDenied.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Period(e) => e.try_as_error(),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for query::report::sales_summary::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::AccessDenied(_) => Some(SalesError::AccessDenied.into()),
            Self::Db(e) => e.try_as_error(),
            Self::Period(e) => e.try_as_error(),
            Self::TeamNotExists(_) => Some(SalesError::TeamNotExists.into()),
            Self::UserNotExists(_) => Some(SalesError::UserNotExists.into()),
        }
    }
}

impl AsError for query::commissions::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for query::commission_draft::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "BASE_CURRENCY_MISMATCH"]
                #[status = BAD_REQUEST]
                #[message = "Base `Currency` must be the working one of the \
                             `Organization`"]
                BaseCurrencyMismatch,

                #[code = "DUPLICATE_ENTRY"]
                #[status = BAD_REQUEST]
                #[message = "`User` is listed more than once"]
                DuplicateEntry,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "Listed `User` is not a member of the \
                             `Organization`"]
                UserNotExists,
            }
        }

        match self {
            Self::BaseCurrencyMismatch(_) => {
                Some(Error::BaseCurrencyMismatch.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::DuplicateEntry(_) => Some(Error::DuplicateEntry.into()),
            Self::NotPrivileged(_) => {
                Some(api::PrivilegeError::NotPrivileged.into())
            }
            Self::OrganizationNotExists(_) => None,
            Self::Overflow(e) => Some(crate::Error::validation(e)),
            Self::Period(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
        }
    }
}

define_error! {
    enum SalesError {
        #[code = "ACCESS_DENIED"]
        #[status = FORBIDDEN]
        #[message = "Only privileged `User`s may see somebody else's sales"]
        AccessDenied,

        #[code = "TEAM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Team` to narrow the sales to does not exist"]
        TeamNotExists,

        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` to narrow the sales to does not exist"]
        UserNotExists,
    }
}

define_error! {
    enum DealError {
        #[code = "DEAL_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Deal` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum OrganizationError {
        #[code = "ORGANIZATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Organization` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum PaymentError {
        #[code = "PAYMENT_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Payment` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum SourceTypeError {
        #[code = "SOURCE_TYPE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`SourceType` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum TeamError {
        #[code = "TEAM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Team` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum WorkTypeError {
        #[code = "WORK_TYPE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`WorkType` with the specified ID does not exist"]
        NotExists,
    }
}
