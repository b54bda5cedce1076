//! [`Deals`] definition.

use common::{
    operations::{By, Select},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Role;
use crate::{
    domain::{
        deal,
        period::{self, Interval, Scope},
        user, Deal, Period, User,
    },
    infra::{database, Database},
    read, Query, Service,
};

/// [`Query`] listing [`Deal`]s made within a [`Period`].
#[derive(Clone, Debug)]
pub struct Deals {
    /// [`Period`] the [`Deal`]s were made within.
    pub period: Period,

    /// [`Scope`] to narrow the [`Deal`]s to.
    pub scope: Scope,

    /// [`deal::Client`] (or its part) to fuzzy search for.
    pub client: Option<deal::Client>,

    /// ID of the [`User`] asking for the [`Deal`]s.
    pub initiator_id: user::Id,
}

/// Output of the [`Deals`] [`Query`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Listed [`Deal`]s, the most recent first.
    pub deals: Vec<Deal>,

    /// [`Interval`] the [`Period`] was resolved into.
    pub interval: Interval,
}

impl<Db> Query<Deals> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Deal>, read::deal::list::Selector>>,
            Ok = Vec<Deal>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, query: Deals) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let Deals {
            period,
            scope,
            client,
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

        let interval = period
            .resolve(DateTime::now())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let deals = self
            .database()
            .execute(Select(By::<Vec<Deal>, _>::new(
                read::deal::list::Selector {
                    organization_id: initiator.organization_id,
                    interval,
                    scope,
                    client,
                },
            )))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output { deals, interval })
    }
}

/// Error of [`Deals`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`User`] without a privileged [`Role`] asks for somebody else's
    /// [`Deal`]s.
    #[display("`User(id: {_0})` may only see own deals")]
    AccessDenied(#[error(not(source))] user::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Period`] cannot be resolved.
    #[display("{_0}")]
    #[from]
    Period(period::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
