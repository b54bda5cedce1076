//! [`Command`] for creating a new [`Deal`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        classification::{source_type, work_type},
        deal, user, Deal, SourceType, User, WorkType,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Deal`].
#[derive(Clone, Debug)]
pub struct CreateDeal {
    /// ID of the [`User`] a new [`Deal`] is assigned to.
    ///
    /// [`None`] assigns it to the initiator.
    pub user_id: Option<user::Id>,

    /// [`deal::Client`] of a new [`Deal`].
    pub client: deal::Client,

    /// ID of the [`WorkType`] of a new [`Deal`].
    pub work_type_id: work_type::Id,

    /// ID of the [`SourceType`] of a new [`Deal`].
    pub source_type_id: source_type::Id,

    /// [`deal::Value`] of a new [`Deal`].
    pub value: deal::Value,

    /// [`DateTime`] when a new [`Deal`] was made.
    pub deal_date: deal::DealDateTime,

    /// [`DateTime`] a new [`Deal`] is expected to be paid by.
    pub due_date: Option<deal::DueDateTime>,

    /// [`deal::Remarks`] about a new [`Deal`].
    pub remarks: Option<deal::Remarks>,

    /// ID of the [`User`] who creates a new [`Deal`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateDeal> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<WorkType>, work_type::Id>>,
            Ok = Option<WorkType>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<SourceType>, source_type::Id>>,
            Ok = Option<SourceType>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateDeal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateDeal {
            user_id,
            client,
            work_type_id,
            source_type_id,
            value,
            deal_date,
            due_date,
            remarks,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;

        let owner = match user_id {
            Some(id) if id != initiator.id => self
                .database()
                .execute(Select(By::<Option<User>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|u| u.organization_id == initiator.organization_id)
                .ok_or(E::UserNotExists(id))
                .map_err(tracerr::wrap!())?,
            Some(_) | None => initiator.clone(),
        };
        if !initiator.oversees(&owner) {
            return Err(tracerr::new!(E::NotOverseer(owner.id)));
        }

        _ = self
            .database()
            .execute(Select(By::<Option<WorkType>, _>::new(work_type_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|t| t.organization_id == initiator.organization_id)
            .ok_or(E::WorkTypeNotExists(work_type_id))
            .map_err(tracerr::wrap!())?;
        _ = self
            .database()
            .execute(Select(By::<Option<SourceType>, _>::new(source_type_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|t| t.organization_id == initiator.organization_id)
            .ok_or(E::SourceTypeNotExists(source_type_id))
            .map_err(tracerr::wrap!())?;

        let deal = Deal {
            id: deal::Id::new(),
            organization_id: initiator.organization_id,
            user_id: owner.id,
            client,
            work_type_id,
            source_type_id,
            value,
            deal_date,
            due_date,
            remarks,
            is_edited: false,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(deal.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(deal)
    }
}

/// Error of [`CreateDeal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Initiator may not act on behalf of the [`User`].
    #[display("Not allowed to act on behalf of `User(id: {_0})`")]
    NotOverseer(#[error(not(source))] user::Id),

    /// [`SourceType`] with the provided ID does not exist.
    #[display("`SourceType(id: {_0})` does not exist")]
    SourceTypeNotExists(#[error(not(source))] source_type::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`WorkType`] with the provided ID does not exist.
    #[display("`WorkType(id: {_0})` does not exist")]
    WorkTypeNotExists(#[error(not(source))] work_type::Id),
}
