//! [`Command`] for registering a new [`Organization`] along with its first
//! administrator.

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Currency, DateTime,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret, SecretBox};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Login, Password, Role};
use crate::{
    domain::{organization, user, Organization, User},
    infra::{database, Database},
    Service,
};

use super::{on_unique_violation, Command};

/// [`Command`] for registering a new [`Organization`].
///
/// The [`Organization`] is created together with its first [`User`] having
/// the [`Role::Admin`], so it never stays unmanaged.
#[derive(Clone, Debug)]
pub struct CreateOrganization {
    /// [`organization::Name`] of a new [`Organization`].
    pub name: organization::Name,

    /// Working [`Currency`] of a new [`Organization`].
    pub currency: Currency,

    /// [`user::Name`] of the administrator.
    pub admin_name: user::Name,

    /// [`Login`] of the administrator.
    pub admin_login: user::Login,

    /// [`Password`] of the administrator.
    pub admin_password: SecretBox<user::Password>,

    /// [`user::Email`] of the administrator.
    pub admin_email: user::Email,
}

/// Output of [`CreateOrganization`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Created [`Organization`].
    pub organization: Organization,

    /// Created administrator of the [`Organization`].
    pub admin: User,
}

impl<Db> Command<CreateOrganization> for Service<Db>
where
    Db: for<'l> Database<
            Select<By<Option<User>, &'l user::Login>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Insert<Organization>,
            Err = Traced<database::Error>,
        >
        + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateOrganization,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateOrganization {
            name,
            currency,
            admin_name,
            admin_login,
            admin_password,
            admin_email,
        } = cmd;

        let occupied = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(&admin_login)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::LoginOccupied(admin_login)));
        }

        let password_hash = tokio::task::spawn_blocking(move || {
            user::PasswordHash::new(admin_password.expose_secret())
        })
        .await
        .map_err(tracerr::from_and_wrap!(=> E))?
        .map_err(tracerr::from_and_wrap!(=> E))?;

        let organization = Organization {
            id: organization::Id::new(),
            name,
            currency,
            created_at: DateTime::now().coerce(),
        };
        let admin = User {
            id: user::Id::new(),
            organization_id: organization.id,
            team_id: None,
            role: user::Role::Admin,
            name: admin_name,
            login: admin_login,
            password_hash,
            email: admin_email,
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(organization.clone()))
            .await
            .map_err(on_unique_violation("organizations_name_unique", || {
                E::NameOccupied(organization.name.clone())
            }))
            .map(drop)?;
        tx.execute(Insert(admin.clone()))
            .await
            .map_err(on_unique_violation("users_login_unique", || {
                E::LoginOccupied(admin.login.clone())
            }))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output {
            organization,
            admin,
        })
    }
}

/// Error of [`CreateOrganization`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Blocking [`Password`] hashing failed to complete.
    #[display("`Password` hashing panicked: {_0}")]
    #[from]
    Hashing(tokio::task::JoinError),

    /// [`Password`] cannot be hashed.
    #[display("{_0}")]
    #[from]
    PasswordHash(user::HashingError),

    /// [`user::Login`] is already occupied.
    #[display("`{_0}` login is occupied")]
    LoginOccupied(#[error(not(source))] user::Login),

    /// [`organization::Name`] is already occupied.
    #[display("`{_0}` organization name is occupied")]
    NameOccupied(#[error(not(source))] organization::Name),
}
