//! In-memory [`Database`] definitions.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact},
    Currency, DateTime,
};
use tracerr::Traced;

use crate::{
    domain::{
        commission::Month,
        organization,
        sales::{self, Collection, Sale},
        team,
        user::{self, Role},
        Commission, Organization, Team, User,
    },
    infra::{database, Database},
};

/// In-memory [`Database`] keeping everything in plain [`Vec`]s.
///
/// Filters by the organization and ID only, so the selected [`Sale`]s are
/// all the stored ones.
#[derive(Clone, Debug, Default)]
pub(crate) struct Mock(Arc<Mutex<State>>);

/// Contents of a [`Mock`] database.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Stored [`Organization`]s.
    pub(crate) organizations: Vec<Organization>,

    /// Stored [`Team`]s.
    pub(crate) teams: Vec<Team>,

    /// Stored [`User`]s.
    pub(crate) users: Vec<User>,

    /// Stored [`Sale`]s.
    pub(crate) sales: Vec<Sale>,

    /// Committed [`Commission`]s.
    pub(crate) commissions: Vec<Commission>,
}

impl Mock {
    /// Locks the [`State`] of this [`Mock`].
    pub(crate) fn state(&self) -> MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores a new [`Organization`] working in the provided [`Currency`].
    pub(crate) fn organization(&self, currency: Currency) -> Organization {
        let org = Organization {
            id: organization::Id::new(),
            name: organization::Name::new("Acme Realty").unwrap(),
            currency,
            created_at: DateTime::now().coerce(),
        };
        self.state().organizations.push(org.clone());
        org
    }

    /// Stores a new [`Team`] of the provided [`Organization`].
    pub(crate) fn team(&self, organization_id: organization::Id) -> Team {
        let team = Team {
            id: team::Id::new(),
            organization_id,
            name: team::Name::new("North").unwrap(),
            created_at: DateTime::now().coerce(),
        };
        self.state().teams.push(team.clone());
        team
    }

    /// Stores a new [`User`] with the provided [`Role`] in the provided
    /// [`Organization`].
    pub(crate) fn user(
        &self,
        organization_id: organization::Id,
        role: Role,
    ) -> User {
        static HASH: LazyLock<user::PasswordHash> = LazyLock::new(|| {
            user::PasswordHash::new(&user::Password::new("password").unwrap())
                .unwrap()
        });

        let user = User {
            id: user::Id::new(),
            organization_id,
            team_id: None,
            role,
            name: user::Name::new("Sita").unwrap(),
            login: user::Login::new("sita").unwrap(),
            password_hash: HASH.clone(),
            email: user::Email::new("sita@example.com").unwrap(),
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };
        self.state().users.push(user.clone());
        user
    }
}

/// [`Transact`]ed [`Mock`] applying its inserts on [`Commit`].
#[derive(Debug)]
pub(crate) struct Transaction {
    /// [`Mock`] to commit into.
    db: Mock,

    /// [`Commission`]s inserted, but not committed yet.
    pending: Mutex<Vec<Commission>>,
}

impl Database<Select<By<Option<User>, user::Id>>> for Mock {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }
}

impl Database<Select<By<Vec<User>, organization::Id>>> for Mock {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, organization::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let org_id = by.into_inner();
        Ok(self
            .state()
            .users
            .iter()
            .filter(|u| u.organization_id == org_id)
            .cloned()
            .collect())
    }
}

impl Database<Select<By<Option<Organization>, organization::Id>>> for Mock {
    type Ok = Option<Organization>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Organization>, organization::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().organizations.iter().find(|o| o.id == id).cloned())
    }
}

impl Database<Select<By<Option<Team>, team::Id>>> for Mock {
    type Ok = Option<Team>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Team>, team::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.state().teams.iter().find(|t| t.id == id).cloned())
    }
}

impl Database<Select<By<Vec<Sale>, sales::Selector>>> for Mock {
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Sale>, sales::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().sales.clone())
    }
}

impl Database<Select<By<Vec<Collection>, sales::Selector>>> for Mock {
    type Ok = Vec<Collection>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<Collection>, sales::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(vec![])
    }
}

impl Database<Transact> for Mock {
    type Ok = Transaction;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        Ok(Transaction {
            db: self.clone(),
            pending: Mutex::default(),
        })
    }
}

impl Database<Lock<By<Commission, (organization::Id, Month)>>>
    for Transaction
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Lock<By<Commission, (organization::Id, Month)>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(())
    }
}

impl Database<Select<By<Vec<Commission>, (organization::Id, Month)>>>
    for Transaction
{
    type Ok = Vec<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Commission>, (organization::Id, Month)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, month) = by.into_inner();
        Ok(self
            .db
            .state()
            .commissions
            .iter()
            .filter(|c| c.organization_id == org_id && c.month == month)
            .cloned()
            .collect())
    }
}

impl Database<Insert<Commission>> for Transaction {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(commission): Insert<Commission>,
    ) -> Result<Self::Ok, Self::Err> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(commission);
        Ok(())
    }
}

impl Database<Commit> for Transaction {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        let pending = std::mem::take(
            &mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner),
        );
        self.db.state().commissions.extend(pending);
        Ok(())
    }
}
