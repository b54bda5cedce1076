//! GraphQL [`Mutation`]s definitions.

use std::fmt;

use common::{Currency, DateTime};
use derive_more::From;
use juniper::{graphql_object, GraphQLEnum, GraphQLUnion, Nullable};
use service::{command, domain, Command as _};

use crate::{
    api::{self, scalar, Failure, FieldError, Status, Validation},
    define_error, AsError, Context, Error, Session,
};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Organization` along with its first admin `User`, and
    /// signs the admin in.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `ORGANIZATION_NAME_OCCUPIED` - provided `OrganizationName` is
    ///                                  occupied by another `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            admin_login = %admin_login,
            currency = %currency,
            gql.name = "createOrganization",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_organization(
        name: api::organization::Name,
        currency: Currency,
        admin_name: api::user::Name,
        admin_login: api::user::Login,
        admin_password: api::user::Password,
        admin_email: api::user::Email,
        ctx: &Context,
    ) -> SessionOutcome {
        let output = ctx
            .service()
            .execute(command::CreateOrganization {
                name: name.into(),
                currency,
                admin_name: admin_name.into(),
                admin_login: admin_login.into(),
                admin_password: secrecy::SecretBox::init_with(move || {
                    admin_password.into()
                }),
                admin_email: admin_email.into(),
            })
            .await;

        match output {
            Ok(out) => {
                Self::sign_in(
                    command::CreateUserSession::ByUserId(out.admin.id),
                    ctx,
                )
                .await
            }
            Err(e) => Failure::from(e.into_error()).into(),
        }
    }

    /// Creates a new `UserSession` with the provided credentials.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSession",
            login = %login,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        login: api::user::Login,
        password: api::user::Password,
        ctx: &Context,
    ) -> SessionOutcome {
        Self::sign_in(
            command::CreateUserSession::ByCredentials {
                login: login.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            },
            ctx,
        )
        .await
    }

    /// Creates a new `User` within the current `Organization`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `LOGIN_OCCUPIED` - provided `UserLogin` is occupied by another `User`;
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is occupied within the
    ///                      `Organization`;
    /// - `NAME_OCCUPIED` - provided `UserName` is occupied within the
    ///                     `Organization`;
    /// - `TEAM_NOT_EXISTS` - the `Team` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUser",
            login = %login,
            name = %name,
            otel.name = Self::SPAN_NAME,
            role = ?role,
            team_id = ?team_id.map(|id| id.to_string()),
        ),
    )]
    pub async fn create_user(
        name: api::user::Name,
        login: api::user::Login,
        password: api::user::Password,
        email: api::user::Email,
        role: api::user::Role,
        team_id: Option<api::team::Id>,
        ctx: &Context,
    ) -> Result<UserOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::CreateUser {
                    name: name.into(),
                    login: login.into(),
                    password: secrecy::SecretBox::init_with(move || {
                        password.into()
                    }),
                    email: email.into(),
                    role: role.into(),
                    team_id: team_id.map(Into::into),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Updates the `UserRole` and/or the `Team` of the `User` with the
    /// provided ID.
    ///
    /// Explicit `null` as `teamId` removes the `User` from its `Team`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `SELF_DEMOTION` - the current `User` tries to demote itself;
    /// - `TEAM_NOT_EXISTS` - the `Team` with the provided ID does not exist;
    /// - `USER_NOT_EXISTS` - the `User` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateUser",
            id = %id,
            otel.name = Self::SPAN_NAME,
            role = ?role,
        ),
    )]
    pub async fn update_user(
        id: api::user::Id,
        role: Option<api::user::Role>,
        team_id: Nullable<api::team::Id>,
        ctx: &Context,
    ) -> Result<UserOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::UpdateUser {
                    user_id: id.into(),
                    role: role.map(Into::into),
                    team_id: patch(team_id),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Deletes the `User` with the provided ID.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `SELF_DELETION` - the current `User` tries to delete itself;
    /// - `USER_NOT_EXISTS` - the `User` with the provided ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteUser",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_user(
        id: api::user::Id,
        ctx: &Context,
    ) -> Result<UserOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::DeleteUser {
                    user_id: id.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Creates a new `Team` within the current `Organization`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `NAME_OCCUPIED` - provided `TeamName` is occupied within the
    ///                     `Organization`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createTeam",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_team(
        name: api::team::Name,
        ctx: &Context,
    ) -> Result<TeamOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::CreateTeam {
                    name: name.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Creates a new `WorkType` within the current `Organization`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_PRIVILEGED` - the current `User` is neither an admin nor a
    ///                      supervisor;
    /// - `NAME_OCCUPIED` - provided `ClassificationName` is occupied by
    ///                     another `WorkType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createWorkType",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_work_type(
        name: api::classification::Name,
        ctx: &Context,
    ) -> Result<WorkTypeOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::CreateWorkType {
                    name: name.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Creates a new `SourceType` within the current `Organization`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_PRIVILEGED` - the current `User` is neither an admin nor a
    ///                      supervisor;
    /// - `NAME_OCCUPIED` - provided `ClassificationName` is occupied by
    ///                     another `SourceType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createSourceType",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_source_type(
        name: api::classification::Name,
        ctx: &Context,
    ) -> Result<SourceTypeOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::CreateSourceType {
                    name: name.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Creates a new `Deal`.
    ///
    /// Privileged `User`s may create a `Deal` on behalf of another `User`
    /// by providing its `userId`.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `VALIDATION_ERROR` - the provided `value` is negative or too large;
    /// - `NOT_OVERSEER` - the current `User` may not act on behalf of
    ///                    another `User`;
    /// - `USER_NOT_EXISTS` - the `User` with the provided ID does not exist;
    /// - `WORK_TYPE_NOT_EXISTS` - the `WorkType` with the provided ID does
    ///                            not exist;
    /// - `SOURCE_TYPE_NOT_EXISTS` - the `SourceType` with the provided ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            client = %client,
            gql.name = "createDeal",
            otel.name = Self::SPAN_NAME,
            value = %value,
        ),
    )]
    pub async fn create_deal(
        user_id: Option<api::user::Id>,
        client: api::deal::Client,
        work_type_id: api::work_type::Id,
        source_type_id: api::source_type::Id,
        value: scalar::Decimal,
        deal_date: DateTime,
        due_date: Option<DateTime>,
        remarks: Option<api::deal::Remarks>,
        ctx: &Context,
    ) -> Result<DealOutcome, Error> {
        let my_id = ctx.current_user_id().await?;
        let value = match deal_value(value) {
            Ok(v) => v,
            Err(failure) => return Ok(failure.into()),
        };

        Ok(settle(
            ctx.service()
                .execute(command::CreateDeal {
                    user_id: user_id.map(Into::into),
                    client: client.into(),
                    work_type_id: work_type_id.into(),
                    source_type_id: source_type_id.into(),
                    value,
                    deal_date: deal_date.coerce(),
                    due_date: due_date.map(DateTime::coerce),
                    remarks: remarks.map(Into::into),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Updates the `Deal` with the provided ID and marks it as edited.
    ///
    /// Explicit `null` as `dueDate` or `remarks` clears them.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `VALIDATION_ERROR` - the provided `value` is negative or too large;
    /// - `DEAL_NOT_EXISTS` - the `Deal` with the provided ID does not exist
    ///                       or is not accessible by the current `User`;
    /// - `VALUE_BELOW_PAID` - the new value is less than the verified
    ///                        payments of the `Deal`;
    /// - `WORK_TYPE_NOT_EXISTS` - the `WorkType` with the provided ID does
    ///                            not exist;
    /// - `SOURCE_TYPE_NOT_EXISTS` - the `SourceType` with the provided ID
    ///                              does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateDeal",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_deal(
        id: api::deal::Id,
        client: Option<api::deal::Client>,
        work_type_id: Option<api::work_type::Id>,
        source_type_id: Option<api::source_type::Id>,
        value: Option<scalar::Decimal>,
        deal_date: Option<DateTime>,
        due_date: Nullable<DateTime>,
        remarks: Nullable<api::deal::Remarks>,
        ctx: &Context,
    ) -> Result<DealOutcome, Error> {
        let my_id = ctx.current_user_id().await?;
        let value = match value.map(deal_value).transpose() {
            Ok(v) => v,
            Err(failure) => return Ok(failure.into()),
        };

        Ok(settle(
            ctx.service()
                .execute(command::UpdateDeal {
                    deal_id: id.into(),
                    client: client.map(Into::into),
                    work_type_id: work_type_id.map(Into::into),
                    source_type_id: source_type_id.map(Into::into),
                    value,
                    deal_date: deal_date.map(DateTime::coerce),
                    due_date: patch::<DateTime, DateTime>(due_date)
                        .map(|d| d.map(DateTime::coerce)),
                    remarks: patch(remarks),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Deletes the `Deal` with the provided ID.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `DEAL_NOT_EXISTS` - the `Deal` with the provided ID does not exist
    ///                       or is not accessible by the current `User`;
    /// - `DEAL_HAS_PAYMENTS` - the `Deal` has `Payment`s recorded against it.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteDeal",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_deal(
        id: api::deal::Id,
        ctx: &Context,
    ) -> Result<DealOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::DeleteDeal {
                    deal_id: id.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Records a new pending `Payment` against the `Deal` with the provided
    /// ID.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `VALIDATION_ERROR` - the provided `amount` is not positive or too
    ///                        large;
    /// - `DEAL_NOT_EXISTS` - the `Deal` with the provided ID does not exist
    ///                       or is not accessible by the current `User`;
    /// - `EXCEEDS_DEAL_VALUE` - the `Payment` would exceed the `Deal` value.
    #[tracing::instrument(
        skip_all,
        fields(
            amount = %amount,
            deal_id = %deal_id,
            gql.name = "createPayment",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_payment(
        deal_id: api::deal::Id,
        amount: scalar::Decimal,
        payment_date: DateTime,
        receipt: Option<api::payment::Receipt>,
        remarks: Option<api::payment::Remarks>,
        ctx: &Context,
    ) -> Result<PaymentOutcome, Error> {
        let my_id = ctx.current_user_id().await?;
        let amount = match validate(
            "amount",
            domain::payment::Amount::new(amount.into()),
            "must be positive and fit into 18 integer digits",
        ) {
            Ok(a) => a,
            Err(failure) => return Ok(failure.into()),
        };

        Ok(settle(
            ctx.service()
                .execute(command::CreatePayment {
                    deal_id: deal_id.into(),
                    amount,
                    payment_date: payment_date.coerce(),
                    receipt: receipt.map(Into::into),
                    remarks: remarks.map(Into::into),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Verifies or denies the pending `Payment` with the provided ID.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_PRIVILEGED` - the current `User` is neither an admin nor a
    ///                      supervisor;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist;
    /// - `PAYMENT_ALREADY_REVIEWED` - the `Payment` is reviewed already;
    /// - `DENIAL_REMARKS_REQUIRED` - the `Payment` is denied without remarks;
    /// - `EXCEEDS_DEAL_VALUE` - verifying the `Payment` would exceed the
    ///                          `Deal` value.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "reviewPayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
            verdict = ?verdict,
        ),
    )]
    pub async fn review_payment(
        id: api::payment::Id,
        verdict: Verdict,
        remarks: Option<api::payment::Remarks>,
        ctx: &Context,
    ) -> Result<PaymentOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        let verdict = match (verdict, remarks) {
            (Verdict::Verify, _) => domain::payment::Verdict::Verify,
            (Verdict::Deny, Some(remarks)) => domain::payment::Verdict::Deny {
                remarks: remarks.into(),
            },
            (Verdict::Deny, None) => {
                return Ok(Failure::new(
                    ReviewError::DenialRemarksRequired.into(),
                    vec![FieldError {
                        field: "remarks".into(),
                        message: "required to deny a `Payment`".into(),
                    }],
                )
                .into());
            }
        };

        Ok(settle(
            ctx.service()
                .execute(command::ReviewPayment {
                    payment_id: id.into(),
                    verdict,
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Deletes the `Payment` with the provided ID.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Possible `Failure` codes:
    /// - `NOT_PRIVILEGED` - the current `User` is neither an admin nor a
    ///                      supervisor;
    /// - `PAYMENT_NOT_EXISTS` - the `Payment` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deletePayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_payment(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<PaymentOutcome, Error> {
        let my_id = ctx.current_user_id().await?;

        Ok(settle(
            ctx.service()
                .execute(command::DeletePayment {
                    payment_id: id.into(),
                    initiator_id: my_id.into(),
                })
                .await,
        ))
    }

    /// Computes and saves the commissions of the provided sheet at once.
    ///
    /// # Errors
    ///
    /// Errors with `AUTHORIZATION_REQUIRED` code if the current `UserSession`
    /// is missing or has expired.
    ///
    /// # Failures
    ///
    /// Business failures are reported in the returned `Status` with one of
    /// the codes:
    /// - `COMMISSION_ALREADY_EXISTS` - a commission of a listed `User` is
    ///                                 saved for the month already;
    /// - `NO_ENTRIES` - the sheet lists nobody;
    /// - any code of the `commissionDraft` query.
    #[tracing::instrument(
        skip_all,
        fields(
            entries = sheet.entries.len(),
            gql.name = "saveCommission",
            month = %sheet.month,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn save_commission(
        sheet: api::commission::Sheet,
        ctx: &Context,
    ) -> Result<Status, Error> {
        let my_id = ctx.current_user_id().await?;
        let (month, base_currency, entries) = match sheet.into_parts() {
            Ok(parts) => parts,
            Err(failure) => return Ok(failure.into()),
        };

        Ok(ctx
            .service()
            .execute(command::SaveCommission {
                month,
                base_currency,
                entries,
                initiator_id: my_id.into(),
            })
            .await
            .map_or_else(
                |e| Failure::from(e.into_error()).into(),
                |saved| {
                    Status::ok(format!(
                        "Saved {} commission(s) for {month}",
                        saved.len(),
                    ))
                },
            ))
    }
}

impl Mutation {
    /// Creates a new [`Session`] and makes it the current one.
    async fn sign_in(
        by: command::CreateUserSession,
        ctx: &Context,
    ) -> SessionOutcome {
        let output = match ctx.service().execute(by).await {
            Ok(out) => out,
            Err(e) => return Failure::from(e.into_error()).into(),
        };

        ctx.set_current_session(Session {
            user_id: output.user.id.into(),
            organization_id: output.user.organization_id.into(),
            token: output.token.clone(),
            expires_at: output.expires_at.coerce(),
        })
        .await;

        output.into()
    }
}

/// Checks the provided `value` of a single input `field`.
///
/// # Errors
///
/// `VALIDATION_ERROR` [`Failure`] pointing at the `field` if the `value` is
/// [`None`].
fn validate<T>(
    field: &str,
    value: Option<T>,
    message: &str,
) -> Result<T, Failure> {
    let mut validation = Validation::default();
    let value = validation.check(field, value, message);
    validation.finish(value)
}

/// Checks the provided `value` of a `Deal`.
fn deal_value(
    value: scalar::Decimal,
) -> Result<domain::deal::Value, Failure> {
    validate(
        "value",
        domain::deal::Value::new(value.into()),
        "must be non-negative and fit into 18 integer digits",
    )
}

/// Turns the result of a [`Command`] into an in-band outcome.
///
/// [`Command`]: service::Command
fn settle<T, E, O>(res: Result<T, E>) -> O
where
    E: AsError + fmt::Display,
    O: From<T> + From<Failure>,
{
    res.map_or_else(|e| Failure::from(e.into_error()).into(), O::from)
}

/// Defines an in-band outcome of a mutation returning an entity.
macro_rules! define_outcome {
    (
        $(#[doc = $doc:literal])*
        $name:ident($gql_name:literal) {
            $variant:ident($object:ty) from $source:ty $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Debug, From, GraphQLUnion)]
        #[graphql(name = $gql_name, context = Context)]
        pub enum $name {
            /// Affected entity.
            $variant($object),

            /// Reason the mutation failed.
            Failure(Failure),
        }

        impl From<$source> for $name {
            fn from(v: $source) -> Self {
                Self::$variant(v.into())
            }
        }
    };
}

define_outcome! {
    /// Outcome of a `Deal` mutation.
    DealOutcome("DealResult") { Deal(api::Deal) from domain::Deal }
}

define_outcome! {
    /// Outcome of a `Payment` mutation.
    PaymentOutcome("PaymentResult") {
        Payment(api::Payment) from domain::Payment,
    }
}

define_outcome! {
    /// Outcome of signing in.
    SessionOutcome("SignInResult") {
        Session(api::user::session::CreateResult)
            from command::create_user_session::Output,
    }
}

define_outcome! {
    /// Outcome of a `SourceType` mutation.
    SourceTypeOutcome("SourceTypeResult") {
        SourceType(api::SourceType) from domain::SourceType,
    }
}

define_outcome! {
    /// Outcome of a `Team` mutation.
    TeamOutcome("TeamResult") { Team(api::Team) from domain::Team }
}

define_outcome! {
    /// Outcome of a `User` mutation.
    UserOutcome("UserResult") { User(api::User) from domain::User }
}

define_outcome! {
    /// Outcome of a `WorkType` mutation.
    WorkTypeOutcome("WorkTypeResult") {
        WorkType(api::WorkType) from domain::WorkType,
    }
}

/// Converts the provided [`Nullable`] argument into a patch of an optional
/// value.
///
/// Omitted argument leaves the value intact, while an explicit `null` clears
/// it.
fn patch<T, U: From<T>>(arg: Nullable<T>) -> Option<Option<U>> {
    match arg {
        Nullable::ImplicitNull => None,
        Nullable::ExplicitNull => Some(None),
        Nullable::Some(v) => Some(Some(v.into())),
    }
}

/// Outcome of a `Payment` review.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PaymentVerdict")]
pub enum Verdict {
    /// Confirm the `Payment` as received.
    Verify,

    /// Reject the `Payment`, requires remarks.
    Deny,
}

define_error! {
    enum ReviewError {
        #[code = "DENIAL_REMARKS_REQUIRED"]
        #[status = BAD_REQUEST]
        #[message = "Denied `Payment` requires remarks"]
        DenialRemarksRequired,
    }
}

impl AsError for command::create_organization::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another `User`"]
                LoginOccupied,

                #[code = "ORGANIZATION_NAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`OrganizationName` is occupied by another \
                             `Organization`"]
                NameOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Hashing(_) | Self::PasswordHash(_) => None,
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::NameOccupied(_) => Some(Error::NameOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::JsonWebTokenEncodeError(_)
            | Self::PasswordVerification(_) => None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Some(Error::WrongCredentials.into())
            }
        }
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is occupied within the \
                             `Organization`"]
                EmailOccupied,

                #[code = "LOGIN_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserLogin` is occupied by another `User`"]
                LoginOccupied,

                #[code = "NAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserName` is occupied within the \
                             `Organization`"]
                NameOccupied,

                #[code = "TEAM_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Team` with the provided ID does not exist"]
                TeamNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
            Self::Hashing(_)
            | Self::PasswordHash(_)
            | Self::UserNotExists(_) => None,
            Self::LoginOccupied(_) => Some(Error::LoginOccupied.into()),
            Self::NameOccupied(_) => Some(Error::NameOccupied.into()),
            Self::NotAdmin(_) => Some(api::PrivilegeError::NotAdmin.into()),
            Self::TeamNotExists(_) => Some(Error::TeamNotExists.into()),
        }
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SELF_DEMOTION"]
                #[status = CONFLICT]
                #[message = "`User` cannot demote itself"]
                SelfDemotion,

                #[code = "TEAM_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`Team` with the provided ID does not exist"]
                TeamNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::NotAdmin.into()),
            Self::SelfDemotion(_) => Some(Error::SelfDemotion.into()),
            Self::TeamNotExists(_) => Some(Error::TeamNotExists.into()),
            Self::UserNotExists(_) => {
                Some(api::query::UserError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "SELF_DELETION"]
                #[status = CONFLICT]
                #[message = "`User` cannot delete itself"]
                SelfDeletion,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotAdmin(_) => Some(api::PrivilegeError::NotAdmin.into()),
            Self::SelfDeletion(_) => Some(Error::SelfDeletion.into()),
            Self::UserNotExists(_) => {
                Some(api::query::UserError::NotExists.into())
            }
        }
    }
}

impl AsError for command::create_team::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NAME_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`TeamName` is occupied within the `Organization`"]
                NameOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NameOccupied(_) => Some(Error::NameOccupied.into()),
            Self::NotAdmin(_) => Some(api::PrivilegeError::NotAdmin.into()),
            Self::UserNotExists(_) => None,
        }
    }
}

/// Implements [`AsError`] for the error of a classification creation.
macro_rules! impl_classification_error {
    ($module:ident) => {
        impl AsError for command::$module::ExecutionError {
            fn try_as_error(&self) -> Option<Error> {
                define_error! {
                    enum Error {
                        #[code = "NAME_OCCUPIED"]
                        #[status = CONFLICT]
                        #[message = "`ClassificationName` is occupied"]
                        NameOccupied,
                    }
                }

                match self {
                    Self::Db(e) => e.try_as_error(),
                    Self::NameOccupied(_) => {
                        Some(Error::NameOccupied.into())
                    }
                    Self::NotPrivileged(_) => {
                        Some(api::PrivilegeError::NotPrivileged.into())
                    }
                    Self::UserNotExists(_) => None,
                }
            }
        }
    };
}

impl_classification_error!(create_work_type);
impl_classification_error!(create_source_type);

impl AsError for command::create_deal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "NOT_OVERSEER"]
                #[status = FORBIDDEN]
                #[message = "Only privileged `User`s may act on behalf of \
                             another `User`"]
                NotOverseer,

                #[code = "USER_NOT_EXISTS"]
                #[status = NOT_FOUND]
                #[message = "`User` with the provided ID does not exist"]
                UserNotExists,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotOverseer(_) => Some(Error::NotOverseer.into()),
            Self::SourceTypeNotExists(_) => {
                Some(api::query::SourceTypeError::NotExists.into())
            }
            Self::UserNotExists(_) => Some(Error::UserNotExists.into()),
            Self::WorkTypeNotExists(_) => {
                Some(api::query::WorkTypeError::NotExists.into())
            }
        }
    }
}

impl AsError for command::update_deal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "VALUE_BELOW_PAID"]
                #[status = CONFLICT]
                #[message = "`Deal` value cannot be less than its verified \
                             `Payment`s"]
                ValueBelowPaid,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::SourceTypeNotExists(_) => {
                Some(api::query::SourceTypeError::NotExists.into())
            }
            Self::UserNotExists(_) => None,
            Self::ValueBelowPaid(_) => Some(Error::ValueBelowPaid.into()),
            Self::WorkTypeNotExists(_) => {
                Some(api::query::WorkTypeError::NotExists.into())
            }
        }
    }
}

impl AsError for command::delete_deal::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "DEAL_HAS_PAYMENTS"]
                #[status = CONFLICT]
                #[message = "`Deal` with recorded `Payment`s cannot be \
                             deleted"]
                DealHasPayments,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealHasPayments(_) => Some(Error::DealHasPayments.into()),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::UserNotExists(_) => None,
        }
    }
}

define_error! {
    enum PaymentError {
        #[code = "EXCEEDS_DEAL_VALUE"]
        #[status = CONFLICT]
        #[message = "Verified `Payment`s cannot exceed the `Deal` value"]
        ExceedsDealValue,
    }
}

impl AsError for command::create_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::DealNotExists(_) => {
                Some(api::query::DealError::NotExists.into())
            }
            Self::ExceedsDealValue(_) => {
                Some(PaymentError::ExceedsDealValue.into())
            }
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::review_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "PAYMENT_ALREADY_REVIEWED"]
                #[status = CONFLICT]
                #[message = "`Payment` is reviewed already"]
                AlreadyReviewed,
            }
        }

        match self {
            Self::AlreadyReviewed(_) => Some(Error::AlreadyReviewed.into()),
            Self::Db(e) => e.try_as_error(),
            Self::ExceedsDealValue(_) => {
                Some(PaymentError::ExceedsDealValue.into())
            }
            Self::NotPrivileged(_) => {
                Some(api::PrivilegeError::NotPrivileged.into())
            }
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::delete_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::NotPrivileged(_) => {
                Some(api::PrivilegeError::NotPrivileged.into())
            }
            Self::PaymentNotExists(_) => {
                Some(api::query::PaymentError::NotExists.into())
            }
            Self::UserNotExists(_) => None,
        }
    }
}

impl AsError for command::save_commission::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "COMMISSION_ALREADY_EXISTS"]
                #[status = CONFLICT]
                #[message = "Commission for this month already exists"]
                AlreadyExists,

                #[code = "NO_ENTRIES"]
                #[status = BAD_REQUEST]
                #[message = "No commission entries provided"]
                NoEntries,
            }
        }

        match self {
            Self::AlreadyExists(..) | Self::AlreadySaved(_) => {
                Some(Error::AlreadyExists.into())
            }
            Self::Db(e) => e.try_as_error(),
            Self::Draft(e) => e.try_as_error(),
            Self::NoEntries => Some(Error::NoEntries.into()),
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::{deal_value, validate};

    #[test]
    fn negative_deal_value_is_field_error() {
        let failure = deal_value(Decimal::NEGATIVE_ONE.into()).unwrap_err();

        assert_eq!(failure.code, "VALIDATION_ERROR");
        assert_eq!(failure.field_errors.len(), 1);
        assert_eq!(failure.field_errors[0].field, "value");
    }

    #[test]
    fn oversized_deal_value_is_field_error() {
        assert!(deal_value(Decimal::MAX.into()).is_err());
        assert_eq!(
            deal_value(Decimal::TEN.into()).unwrap().amount(),
            Decimal::TEN,
        );
    }

    #[test]
    fn invalid_field_is_named_in_failure() {
        let failure =
            validate::<()>("amount", None, "must be positive").unwrap_err();

        assert_eq!(failure.field_errors[0].field, "amount");
        assert_eq!(failure.field_errors[0].message, "must be positive");
    }
}
