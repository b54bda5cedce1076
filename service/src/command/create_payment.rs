//! [`Command`] for recording a new [`Payment`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{deal, payment, user, Deal, Payment, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a new [`Payment`] against a [`Deal`].
///
/// A new [`Payment`] always awaits a review.
#[derive(Clone, Debug)]
pub struct CreatePayment {
    /// ID of the [`Deal`] a new [`Payment`] is made against.
    pub deal_id: deal::Id,

    /// [`payment::Amount`] of a new [`Payment`].
    pub amount: payment::Amount,

    /// [`DateTime`] when a new [`Payment`] was received.
    pub payment_date: payment::PaymentDateTime,

    /// [`payment::Receipt`] of a new [`Payment`].
    pub receipt: Option<payment::Receipt>,

    /// [`payment::Remarks`] about a new [`Payment`].
    pub remarks: Option<payment::Remarks>,

    /// ID of the [`User`] who records a new [`Payment`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreatePayment> for Service<Db>
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
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Payment;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePayment {
            deal_id,
            amount,
            payment_date,
            receipt,
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

        let paid = tx
            .execute(Select(By::<Vec<Payment>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .iter()
            .filter(|p| p.is_verified())
            .map(|p| p.amount.value())
            .sum::<Decimal>();
        if paid + amount.value() > deal.value.amount() {
            return Err(tracerr::new!(E::ExceedsDealValue(
                deal.value.amount() - paid
            )));
        }

        let payment = Payment {
            id: payment::Id::new(),
            deal_id,
            amount,
            payment_date,
            receipt,
            remarks,
            status: payment::Status::Pending,
            is_edited: false,
            created_at: DateTime::now().coerce(),
        };

        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(payment)
    }
}

/// Error of [`CreatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Deal`] with the provided ID does not exist or is not accessible.
    #[display("`Deal(id: {_0})` does not exist")]
    DealNotExists(#[error(not(source))] deal::Id),

    /// [`payment::Amount`] exceeds the unpaid remainder of the [`Deal`]
    /// value.
    #[display("`Payment` exceeds the remaining {_0} of the `Deal` value")]
    ExceedsDealValue(#[error(not(source))] Decimal),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
