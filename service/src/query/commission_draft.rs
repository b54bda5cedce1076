//! [`CommissionDraft`] definition.

use std::collections::{HashMap, HashSet};

use common::{
    operations::{By, Select},
    Currency,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{commission::State, user::Role};
use crate::{
    domain::{
        commission::{self, Month, Terms},
        organization, period,
        sales::{self, Sale},
        user, Commission, Organization, User,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] computing [`State::Draft`] [`Commission`]s of a [`Month`]
/// without persisting them.
///
/// Total sales of each salesperson are the values of their deals made within
/// the [`Month`], in the working [`Currency`] of the [`Organization`].
#[derive(Clone, Debug)]
pub struct CommissionDraft {
    /// [`Month`] to compute the [`Commission`]s for.
    pub month: Month,

    /// [`Currency`] the sales are expected to be denominated in.
    pub base_currency: Currency,

    /// [`Terms`] of every salesperson to compute a [`Commission`] for.
    pub entries: Vec<Terms>,

    /// ID of the [`User`] asking for the [`Commission`]s.
    pub initiator_id: user::Id,
}

/// Output of the [`CommissionDraft`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Organization`] the [`Commission`]s are computed within.
    pub organization: Organization,

    /// Computed [`Commission`]s, in the order of the provided [`Terms`].
    pub commissions: Vec<Commission>,
}

impl<Db> Query<CommissionDraft> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Organization>, organization::Id>>,
            Ok = Option<Organization>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<User>, organization::Id>>,
            Ok = Vec<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Sale>, sales::Selector>>,
            Ok = Vec<Sale>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: CommissionDraft,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CommissionDraft {
            month,
            base_currency,
            entries,
            initiator_id,
        } = query;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if !initiator.role.is_privileged() {
            return Err(tracerr::new!(E::NotPrivileged(initiator_id)));
        }

        let organization = self
            .database()
            .execute(Select(By::<Option<Organization>, _>::new(
                initiator.organization_id,
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::OrganizationNotExists(initiator.organization_id))
            .map_err(tracerr::wrap!())?;
        if organization.currency != base_currency {
            return Err(tracerr::new!(E::BaseCurrencyMismatch(
                organization.currency
            )));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        if let Some(dup) = entries.iter().find(|t| !seen.insert(t.user_id)) {
            return Err(tracerr::new!(E::DuplicateEntry(dup.user_id)));
        }

        let members = self
            .database()
            .execute(Select(By::<Vec<User>, _>::new(organization.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .map(|u| (u.id, u))
            .collect::<HashMap<_, _>>();

        let interval =
            month.interval().map_err(tracerr::from_and_wrap!(=> E))?;
        let sales = self
            .database()
            .execute(Select(By::<Vec<Sale>, _>::new(sales::Selector {
                organization_id: organization.id,
                interval,
                scope: period::Scope::default(),
            })))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let by_user = sales::aggregate(&sales, &[], interval).by_user;

        let rates = self.rates().await;
        let commissions = entries
            .into_iter()
            .map(|terms| {
                let member = members
                    .get(&terms.user_id)
                    .ok_or(E::UserNotExists(terms.user_id))
                    .map_err(tracerr::wrap!())?;
                let total_sales = by_user
                    .get(&terms.user_id)
                    .map(|s| s.total_sales_deal_value)
                    .unwrap_or_default();
                Commission::draft(
                    organization.id,
                    member.name.clone(),
                    month,
                    base_currency,
                    total_sales,
                    terms,
                    &rates,
                )
                .map_err(tracerr::from_and_wrap!(=> E))
            })
            .collect::<Result<Vec<_>, Traced<E>>>()?;

        Ok(Output {
            organization,
            commissions,
        })
    }
}

/// Error of [`CommissionDraft`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// Provided base [`Currency`] differs from the working one of the
    /// [`Organization`].
    #[display("Base currency must be `{_0}`")]
    BaseCurrencyMismatch(#[error(not(source))] Currency),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Terms`] of the same [`User`] are provided more than once.
    #[display("`User(id: {_0})` is listed more than once")]
    DuplicateEntry(#[error(not(source))] user::Id),

    /// [`User`] has neither [`Role::Admin`] nor [`Role::Supervisor`].
    #[display("`User(id: {_0})` is not privileged")]
    NotPrivileged(#[error(not(source))] user::Id),

    /// [`Organization`] with the provided ID does not exist.
    #[display("`Organization(id: {_0})` does not exist")]
    OrganizationNotExists(#[error(not(source))] organization::Id),

    /// Computed [`Commission`] figures are out of range.
    #[display("{_0}")]
    #[from]
    Overflow(commission::Overflow),

    /// [`Month`] cannot be turned into a reporting period.
    #[display("{_0}")]
    #[from]
    Period(period::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
