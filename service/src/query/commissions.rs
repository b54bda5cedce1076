//! [`Commissions`] definition.

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::Role;
use crate::{
    domain::{commission::Month, organization, user, Commission, User},
    infra::{database, Database},
    Query, Service,
};

/// [`Query`] of the [`Commission`]s saved for a [`Month`].
///
/// A [`User`] without a privileged [`Role`] sees their own [`Commission`]
/// only. Nothing saved for the [`Month`] yet results in an empty list.
#[derive(Clone, Copy, Debug)]
pub struct Commissions {
    /// [`Month`] the [`Commission`]s were saved for.
    pub month: Month,

    /// ID of the [`User`] asking for the [`Commission`]s.
    pub initiator_id: user::Id,
}

impl<Db> Query<Commissions> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Commission>, (organization::Id, Month)>>,
            Ok = Vec<Commission>,
            Err = Traced<database::Error>,
        >,
{
    type Ok = Vec<Commission>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        Commissions {
            month,
            initiator_id,
        }: Commissions,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let mut commissions = self
            .database()
            .execute(Select(By::<Vec<Commission>, _>::new((
                initiator.organization_id,
                month,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !initiator.role.is_privileged() {
            commissions.retain(|c| c.user_id == initiator.id);
        }

        Ok(commissions)
    }
}

/// Error of [`Commissions`] [`Query`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
