//! [`SalesSummary`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{user::Role, Deal, Payment};
use crate::{
    domain::{
        period::{self, Interval, Scope},
        sales::{self, Collection, Sale},
        team, user, Period, Team, User,
    },
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] aggregating sales of an organization over a [`Period`].
///
/// Only [`Deal`]s made and [`Payment`]s received within the resolved
/// [`Interval`] are taken into account.
#[derive(Clone, Copy, Debug)]
pub struct SalesSummary {
    /// [`Period`] to report the sales for.
    pub period: Period,

    /// [`Scope`] to narrow the sales to.
    pub scope: Scope,

    /// ID of the [`User`] asking for the report.
    pub initiator_id: user::Id,
}

/// Output of the [`SalesSummary`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Aggregated [`sales::Report`].
    pub report: sales::Report,

    /// [`Interval`] the [`Period`] was resolved into.
    pub interval: Interval,

    /// Human-readable label of the [`Period`].
    pub label: String,
}

impl<Db> Query<SalesSummary> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Team>, team::Id>>,
            Ok = Option<Team>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Sale>, sales::Selector>>,
            Ok = Vec<Sale>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Collection>, sales::Selector>>,
            Ok = Vec<Collection>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        query: SalesSummary,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SalesSummary {
            period,
            scope,
            initiator_id,
        } = query;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        let scope = scope
            .narrowed_for(initiator.id, initiator.role)
            .ok_or(E::AccessDenied(initiator_id))
            .map_err(tracerr::wrap!())?;
        if let Some(id) = scope.team_id {
            _ = self
                .database()
                .execute(Select(By::<Option<Team>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|t| t.organization_id == initiator.organization_id)
                .ok_or(E::TeamNotExists(id))
                .map_err(tracerr::wrap!())?;
        }
        if let Some(id) = scope.user_id.filter(|id| *id != initiator.id) {
            _ = self
                .database()
                .execute(Select(By::<Option<User>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|u| u.organization_id == initiator.organization_id)
                .ok_or(E::UserNotExists(id))
                .map_err(tracerr::wrap!())?;
        }

        let interval = period
            .resolve(DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        let selector = sales::Selector {
            organization_id: initiator.organization_id,
            interval,
            scope,
        };

        let sales = self
            .database()
            .execute(Select(By::<Vec<Sale>, _>::new(selector)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let collections = self
            .database()
            .execute(Select(By::<Vec<Collection>, _>::new(selector)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            report: sales::aggregate(&sales, &collections, interval),
            interval,
            label: period.label(),
        })
    }
}

/// Error of [`SalesSummary`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`User`] without a privileged [`Role`] asks for somebody else's
    /// sales.
    #[display("`User(id: {_0})` may only see own sales")]
    AccessDenied(#[error(not(source))] user::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Period`] cannot be resolved.
    #[display("{_0}")]
    #[from]
    Period(period::Error),

    /// [`Team`] to narrow the sales to does not exist in the organization.
    #[display("`Team(id: {_0})` does not exist")]
    TeamNotExists(#[error(not(source))] team::Id),

    /// [`User`] with the provided ID does not exist in the organization.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use futures::executor::block_on;

    use crate::{
        domain::{
            period::Scope,
            team,
            user::{self, Role},
            Period,
        },
        infra::database::mock::Mock,
        Query as _, Service,
    };

    use super::{ExecutionError, SalesSummary};

    fn summary(
        db: &Mock,
        initiator_id: user::Id,
        scope: Scope,
    ) -> Result<(), ExecutionError> {
        block_on(Service::mock(db.clone()).execute(SalesSummary {
            period: Period::ThisMonth,
            scope,
            initiator_id,
        }))
        .map(drop)
        .map_err(tracerr::Traced::into_inner)
    }

    #[test]
    fn reports_on_own_team_and_member() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let team = db.team(org.id);
        let seller = db.user(org.id, Role::Salesperson);

        let scope = Scope {
            team_id: Some(team.id),
            user_id: Some(seller.id),
        };

        assert!(summary(&db, admin.id, scope).is_ok());
    }

    #[test]
    fn rejects_unknown_team() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let foreign = db.team(db.organization(Currency::USD).id);

        for id in [team::Id::new(), foreign.id] {
            let scope = Scope {
                team_id: Some(id),
                user_id: None,
            };

            let err = summary(&db, admin.id, scope).unwrap_err();

            assert!(
                matches!(err, ExecutionError::TeamNotExists(t) if t == id),
                "unexpected: {err}",
            );
        }
    }

    #[test]
    fn rejects_unknown_user() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let foreign = db.user(db.organization(Currency::USD).id, Role::Admin);

        for id in [user::Id::new(), foreign.id] {
            let scope = Scope {
                team_id: None,
                user_id: Some(id),
            };

            let err = summary(&db, admin.id, scope).unwrap_err();

            assert!(
                matches!(err, ExecutionError::UserNotExists(u) if u == id),
                "unexpected: {err}",
            );
        }
    }
}
