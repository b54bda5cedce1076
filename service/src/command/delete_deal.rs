//! [`Command`] for deleting a [`Deal`].

use common::operations::{
    By, Commit, Delete, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{deal, user, Deal, Payment, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Deal`] having no [`Payment`]s.
#[derive(Clone, Copy, Debug)]
pub struct DeleteDeal {
    /// ID of the [`Deal`] to delete.
    pub deal_id: deal::Id,

    /// ID of the [`User`] who deletes the [`Deal`].
    pub initiator_id: user::Id,
}

impl<Db> Command<DeleteDeal> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Deal, deal::Id>>,
            Err = Traced<database::Error>,
        >
        + Database<
            Select<By<Option<Deal>, deal::Id>>,
            Ok = Option<Deal>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Payment>, deal::Id>>,
            Ok = Vec<Payment>,
            Err = Traced<database::Error>,
        > + Database<Delete<By<Deal, deal::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: DeleteDeal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let DeleteDeal {
            deal_id,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|d| d.is_accessible_by(&initiator))
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !payments.is_empty() {
            return Err(tracerr::new!(E::DealHasPayments(deal_id)));
        }

        tx.execute(Delete(By::<Deal, _>::new(deal_id)))
            .await
            .map_err(|e| {
                if e.as_ref().is_foreign_key_violation() {
                    tracerr::new!(E::DealHasPayments(deal_id))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(deal)
    }
}

/// Error of [`DeleteDeal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] has [`Payment`]s, so cannot be deleted.
    #[display("`Deal(id: {_0})` has payments")]
    DealHasPayments(#[error(not(source))] deal::Id),

    /// [`Deal`] with the provided ID does not exist or is not accessible.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
