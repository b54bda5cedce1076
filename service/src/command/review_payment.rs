//! [`Command`] for reviewing a [`Payment`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use rust_decimal::Decimal;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{payment::Status, user::Role};
use crate::{
    domain::{deal, payment, user, Deal, Payment, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for verifying or denying a [`Status::Pending`] [`Payment`].
///
/// Available to [`Role::Admin`]s and [`Role::Supervisor`]s only.
#[derive(Clone, Debug)]
pub struct ReviewPayment {
    /// ID of the [`Payment`] to review.
    pub payment_id: payment::Id,

    /// [`payment::Verdict`] of the review.
    pub verdict: payment::Verdict,

    /// ID of the [`User`] who reviews the [`Payment`].
    pub initiator_id: user::Id,
}

impl<Db> Command<ReviewPayment> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Payment>, payment::Id>>,
            Ok = Option<Payment>,
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
        cmd: ReviewPayment,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let ReviewPayment {
            payment_id,
            verdict,
            initiator_id,
        } = cmd;

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

        let deal_id = self
            .database()
            .execute(Select(By::<Option<Payment>, _>::new(payment_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?
            .deal_id;

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
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        let payments = tx
            .execute(Select(By::<Vec<Payment>, _>::new(deal_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let paid = payments
            .iter()
            .filter(|p| p.is_verified())
            .map(|p| p.amount.value())
            .sum::<Decimal>();
        let mut payment = payments
            .into_iter()
            .find(|p| p.id == payment_id)
            .ok_or(E::PaymentNotExists(payment_id))
            .map_err(tracerr::wrap!())?;

        payment
            .review(verdict, initiator_id, DateTime::now().coerce())
            .map_err(tracerr::from_and_wrap!(=> E))?;
        if payment.is_verified()
            && paid + payment.amount.value() > deal.value.amount()
        {
            return Err(tracerr::new!(E::ExceedsDealValue(
                deal.value.amount() - paid
            )));
        }

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

/// Error of [`ReviewPayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Payment`] has been reviewed already.
    #[display("{_0}")]
    #[from]
    AlreadyReviewed(payment::AlreadyReviewed),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Verifying the [`Payment`] would make the [`Deal`] over-paid.
    #[display("`Payment` exceeds the remaining {_0} of the `Deal` value")]
    ExceedsDealValue(#[error(not(source))] Decimal),

    /// [`User`] has neither [`Role::Admin`] nor [`Role::Supervisor`].
    #[display("`User(id: {_0})` is not privileged")]
    NotPrivileged(#[error(not(source))] user::Id),

    /// [`Payment`] with the provided ID does not exist.
    #[display("`Payment(id: {_0})` does not exist")]
    PaymentNotExists(#[error(not(source))] payment::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
