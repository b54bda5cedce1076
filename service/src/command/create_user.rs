//! [`Command`] for creating a new [`User`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{
    user::{Email, Login, Name, Password, Role},
    Organization,
};
use crate::{
    domain::{organization, team, user, Team, User},
    infra::{database, Database},
    Service,
};

use super::{on_unique_violation, Command};

/// [`Command`] for creating a new [`User`] in the [`Organization`] of its
/// initiator.
#[derive(Clone, Debug)]
pub struct CreateUser {
    /// [`Name`] of a new [`User`].
    pub name: user::Name,

    /// [`Login`] of a new [`User`].
    pub login: user::Login,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Role`] of a new [`User`].
    pub role: user::Role,

    /// ID of the [`Team`] a new [`User`] joins, if any.
    pub team_id: Option<team::Id>,

    /// ID of the [`User`] who creates a new [`User`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, (organization::Id, &'e user::Email)>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<By<Option<User>, (organization::Id, &'n user::Name)>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Team>, team::Id>>,
            Ok = Option<Team>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            name,
            login,
            password,
            email,
            role,
            team_id,
            initiator_id,
        } = cmd;

        let initiator = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(initiator_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(initiator_id))
            .map_err(tracerr::wrap!())?;
        if initiator.role != user::Role::Admin {
            return Err(tracerr::new!(E::NotAdmin(initiator_id)));
        }
        let org_id = initiator.organization_id;

        if let Some(id) = team_id {
            _ = self
                .database()
                .execute(Select(By::<Option<Team>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|t| t.organization_id == org_id)
                .ok_or(E::TeamNotExists(id))
                .map_err(tracerr::wrap!())?;
        }

        let occupied = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(&login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(login)));
        }
        let occupied = self
            .database()
            .execute(Select(By::<Option<User>, _>::new((org_id, &email))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }
        let occupied = self
            .database()
            .execute(Select(By::<Option<User>, _>::new((org_id, &name))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let password_hash = tokio::task::spawn_blocking(move || {
            user::PasswordHash::new(password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let user = User {
            id: user::Id::new(),
            organization_id: org_id,
            team_id,
            role,
            name,
            login,
            password_hash,
            email,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        // Unique indexes still guard against concurrent registrations.
        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                let err = e.as_ref();
                if err.is_unique_violation(Some("users_email_unique")) {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else if err.is_unique_violation(Some("users_name_unique")) {
                    tracerr::new!(E::NameOccupied(user.name.clone()))
                } else {
                    on_unique_violation("users_login_unique", || {
                        E::LoginOccupied(user.login.clone())
                    })(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Email`] is already occupied in the [`Organization`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),

    /// Blocking [`Password`] hashing failed to complete.
    #[display("`Password` hashing panicked: {_0}")]
    #[from]
    Hashing(tokio::task::JoinError),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`user::Name`] is already occupied in the [`Organization`].
    #[display("`{_0}` name is occupied")]
    NameOccupied(#[error(not(source))] user::Name),

    /// [`User`] is not an [`Role::Admin`].
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Password`] cannot be hashed.
    #[display("{_0}")]
    #[from]
    PasswordHash(user::HashingError),

    /// [`Team`] with the provided ID does not exist.
    #[display("`Team(id: {_0})` does not exist")]
    TeamNotExists(#[error(not(source))] team::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
