//! [`Command`] for saving monthly [`Commission`]s.

use std::collections::HashSet;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Currency, DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{commission::State, User};
use crate::{
    domain::{
        commission::{self, Month, Terms},
        organization, user, Commission,
    },
    infra::{database, Database},
    query::{commission_draft, CommissionDraft},
    Query, Service,
};

use super::{on_unique_violation, Command};

/// [`Command`] for saving monthly [`Commission`]s of salespeople.
///
/// Every [`Commission`] is recomputed out of its [`Terms`] and the whole
/// batch is saved atomically. A [`Commission`] of a [`User`] is saved once
/// per [`Month`], so the batch is rejected if any of them exists already.
#[derive(Clone, Debug)]
pub struct SaveCommission {
    /// [`Month`] to save the [`Commission`]s for.
    pub month: Month,

    /// [`Currency`] the sales are denominated in.
    pub base_currency: Currency,

    /// [`Terms`] of every salesperson to save a [`Commission`] for.
    pub entries: Vec<Terms>,

    /// ID of the [`User`] who saves the [`Commission`]s.
    pub initiator_id: user::Id,
}

impl<Db> Command<SaveCommission> for Service<Db>
where
    Self: Query<
        CommissionDraft,
        Ok = commission_draft::Output,
        Err = Traced<commission_draft::ExecutionError>,
    >,
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Commission, (organization::Id, Month)>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Commission>, (organization::Id, Month)>>,
            Ok = Vec<Commission>,
            Err = Traced<database::Error>,
        > + Database<Insert<Commission>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Vec<Commission>;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: SaveCommission,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let SaveCommission {
            month,
            base_currency,
            entries,
            initiator_id,
        } = cmd;

        if entries.is_empty() {
            return Err(tracerr::new!(E::NoEntries));
        }

        let commission_draft::Output {
            organization,
            commissions: mut drafts,
        } = self
            .execute(CommissionDraft {
                month,
                base_currency,
                entries,
                initiator_id,
            })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serializes concurrent saves of the same `Month`.
        tx.execute(Lock(By::new((organization.id, month))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let saved = tx
            .execute(Select(By::<Vec<Commission>, _>::new((
                organization.id,
                month,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .map(|c| c.user_id)
            .collect::<HashSet<_>>();
        if let Some(dup) = drafts.iter().find(|c| saved.contains(&c.user_id)) {
            return Err(tracerr::new!(E::AlreadyExists(dup.user_id, month)));
        }

        let now = DateTime::now();
        for commission in &mut drafts {
            commission
                .save(now.coerce())
                .map_err(tracerr::from_and_wrap!(=> E))?;

            let (user_id, month) = (commission.user_id, commission.month);
            tx.execute(Insert(commission.clone()))
                .await
                .map_err(on_unique_violation(
                    "commissions_user_month_unique",
                    || E::AlreadyExists(user_id, month),
                ))
                .map(drop)?;
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(drafts)
    }
}

/// Error of [`SaveCommission`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Commission`] of the [`User`] for the [`Month`] is saved already.
    #[display("`Commission` of `User(id: {_0})` for {_1} already exists")]
    AlreadyExists(user::Id, Month),

    /// [`Commission`] is not a [`State::Draft`] anymore.
    #[display("{_0}")]
    #[from]
    AlreadySaved(commission::AlreadySaved),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Commission`]s cannot be computed.
    #[display("{_0}")]
    #[from]
    Draft(commission_draft::ExecutionError),

    /// No [`Terms`] provided.
    #[display("No commission entries provided")]
    NoEntries,
}

#[cfg(test)]
mod spec {
    use common::{Currency, Percent};
    use futures::executor::block_on;
    use rust_decimal::Decimal;

    use crate::{
        domain::{
            commission::{Bonus, Month, Terms},
            user::{self, Role},
        },
        infra::database::mock::Mock,
        query::commission_draft,
        Command as _, Service,
    };

    use super::{ExecutionError, SaveCommission};

    fn month() -> Month {
        "2024-03".parse().unwrap()
    }

    fn terms(user_id: user::Id) -> Terms {
        Terms {
            user_id,
            currency: Currency::USD,
            percent: Percent::new(Decimal::TEN).unwrap(),
            bonus: Bonus::new(Decimal::ONE_HUNDRED).unwrap(),
            rate: None,
        }
    }

    fn save(
        db: &Mock,
        initiator_id: user::Id,
        base_currency: Currency,
        entries: Vec<Terms>,
    ) -> Result<usize, ExecutionError> {
        block_on(Service::mock(db.clone()).execute(SaveCommission {
            month: month(),
            base_currency,
            entries,
            initiator_id,
        }))
        .map(|saved| saved.len())
        .map_err(tracerr::Traced::into_inner)
    }

    #[test]
    fn saves_every_entry() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let (a, b) = (
            db.user(org.id, Role::Salesperson),
            db.user(org.id, Role::Salesperson),
        );

        let entries = vec![terms(a.id), terms(b.id)];

        assert_eq!(save(&db, admin.id, Currency::USD, entries).unwrap(), 2);
        let state = db.state();
        assert_eq!(state.commissions.len(), 2);
        assert!(state.commissions.iter().all(|c| c.month == month()));
        assert!(state
            .commissions
            .iter()
            .all(|c| c.figures.total_received == Decimal::ONE_HUNDRED));
    }

    #[test]
    fn rejects_batch_if_any_is_saved_already() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let (a, b) = (
            db.user(org.id, Role::Salesperson),
            db.user(org.id, Role::Salesperson),
        );
        _ = save(&db, admin.id, Currency::USD, vec![terms(a.id)]).unwrap();

        let entries = vec![terms(b.id), terms(a.id)];
        let err = save(&db, admin.id, Currency::USD, entries).unwrap_err();

        assert!(
            matches!(err, ExecutionError::AlreadyExists(id, m)
                if id == a.id && m == month()),
            "unexpected: {err}",
        );
        let state = db.state();
        assert_eq!(state.commissions.len(), 1);
        assert!(state.commissions.iter().all(|c| c.user_id == a.id));
    }

    #[test]
    fn rejects_empty_sheet() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);

        let err = save(&db, admin.id, Currency::USD, vec![]).unwrap_err();

        assert!(matches!(err, ExecutionError::NoEntries), "unexpected: {err}");
        assert!(db.state().commissions.is_empty());
    }

    #[test]
    fn rejects_foreign_base_currency() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let seller = db.user(org.id, Role::Salesperson);
        let npr = "NPR".parse().unwrap();

        let err =
            save(&db, admin.id, npr, vec![terms(seller.id)]).unwrap_err();

        assert!(
            matches!(
                err,
                ExecutionError::Draft(
                    commission_draft::ExecutionError::BaseCurrencyMismatch(c),
                ) if c == Currency::USD,
            ),
            "unexpected: {err}",
        );
        assert!(db.state().commissions.is_empty());
    }

    #[test]
    fn rejects_duplicate_entry() {
        let db = Mock::default();
        let org = db.organization(Currency::USD);
        let admin = db.user(org.id, Role::Admin);
        let seller = db.user(org.id, Role::Salesperson);

        let entries = vec![terms(seller.id), terms(seller.id)];
        let err = save(&db, admin.id, Currency::USD, entries).unwrap_err();

        assert!(
            matches!(
                err,
                ExecutionError::Draft(
                    commission_draft::ExecutionError::DuplicateEntry(id),
                ) if id == seller.id,
            ),
            "unexpected: {err}",
        );
        assert!(db.state().commissions.is_empty());
    }
}
