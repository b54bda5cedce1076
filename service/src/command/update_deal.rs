//! [`Command`] for editing a [`Deal`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::payment::Status;
use crate::{
    domain::{
        classification::{source_type, work_type},
        deal, user, Deal, Payment, SourceType, User, WorkType,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for editing a [`Deal`].
///
/// Omitted fields are left untouched. Any applied change marks the [`Deal`]
/// as edited.
#[derive(Clone, Debug)]
pub struct UpdateDeal {
    /// ID of the [`Deal`] to edit.
    pub deal_id: deal::Id,

    /// New [`deal::Client`] of the [`Deal`].
    pub client: Option<deal::Client>,

    /// ID of the new [`WorkType`] of the [`Deal`].
    pub work_type_id: Option<work_type::Id>,

    /// ID of the new [`SourceType`] of the [`Deal`].
    pub source_type_id: Option<source_type::Id>,

    /// New [`deal::Value`] of the [`Deal`].
    pub value: Option<deal::Value>,

    /// New [`deal::DealDateTime`] of the [`Deal`].
    pub deal_date: Option<deal::DealDateTime>,

    /// New [`deal::DueDateTime`] of the [`Deal`], where
    /// [`Some`]`(`[`None`]`)` removes it.
    pub due_date: Option<Option<deal::DueDateTime>>,

    /// New [`deal::Remarks`] of the [`Deal`], where [`Some`]`(`[`None`]`)`
    /// removes them.
    pub remarks: Option<Option<deal::Remarks>>,

    /// ID of the [`User`] who edits the [`Deal`].
    pub initiator_id: user::Id,
}

impl<Db> Command<UpdateDeal> for Service<Db>
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
        > + Database<Insert<Deal>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Deal;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateDeal) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateDeal {
            deal_id,
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

        if let Some(id) = work_type_id {
            _ = self
                .database()
                .execute(Select(By::<Option<WorkType>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|t| t.organization_id == initiator.organization_id)
                .ok_or(E::WorkTypeNotExists(id))
                .map_err(tracerr::wrap!())?;
        }
        if let Some(id) = source_type_id {
            _ = self
                .database()
                .execute(Select(By::<Option<SourceType>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|t| t.organization_id == initiator.organization_id)
                .ok_or(E::SourceTypeNotExists(id))
                .map_err(tracerr::wrap!())?;
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes with payments being added or reviewed.
        tx.execute(Lock(By::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut deal = tx
            .execute(Select(By::<Option<Deal>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|d| d.is_accessible_by(&initiator))
            .ok_or(E::DealNotExists(deal_id))
            .map_err(tracerr::wrap!())?;

        if let Some(value) = value {
            let paid = tx
                .execute(Select(By::<Vec<Payment>, _>::new(deal_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .iter()
                .filter(|p| p.is_verified())
                .map(|p| p.amount.value())
                .sum::<Decimal>();
            if value.amount() < paid {
                return Err(tracerr::new!(E::ValueBelowPaid(paid)));
            }
            deal.value = value;
        }
        if let Some(client) = client {
            deal.client = client;
        }
        if let Some(id) = work_type_id {
            deal.work_type_id = id;
        }
        if let Some(id) = source_type_id {
            deal.source_type_id = id;
        }
        if let Some(date) = deal_date {
            deal.deal_date = date;
        }
        if let Some(date) = due_date {
            deal.due_date = date;
        }
        if let Some(remarks) = remarks {
            deal.remarks = remarks;
        }
        deal.is_edited = true;

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

/// Error of [`UpdateDeal`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist or is not accessible.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// [`SourceType`] with the provided ID does not exist.
    #[display("`SourceType(id: {_0})` does not exist")]
    SourceTypeNotExists(#[error(not(source))] source_type::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// New [`deal::Value`] is less than the sum of [`Status::Verified`]
    /// [`Payment`]s.
    #[display("`Deal` value cannot be less than the paid {_0}")]
    ValueBelowPaid(#[error(not(source))] Decimal),

    /// [`WorkType`] with the provided ID does not exist.
    #[display("`WorkType(id: {_0})` does not exist")]
    WorkTypeNotExists(#[error(not(source))] work_type::Id),
}
