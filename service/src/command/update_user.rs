//! [`Command`] for changing the [`Role`] or the [`Team`] of a [`User`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{user::Role, Organization};
use crate::{
    domain::{team, user, Team, User},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for changing the [`Role`] or the [`Team`] of a [`User`].
///
/// Omitted fields are left untouched.
#[derive(Clone, Copy, Debug)]
pub struct UpdateUser {
    /// ID of the [`User`] to update.
    pub user_id: user::Id,

    /// New [`Role`] of the [`User`].
    pub role: Option<user::Role>,

    /// New [`Team`] of the [`User`], where [`Some`]`(`[`None`]`)` removes
    /// the [`User`] from any [`Team`].
    pub team_id: Option<Option<team::Id>>,

    /// ID of the [`User`] who performs the update.
    pub initiator_id: user::Id,
}

impl<Db> Command<UpdateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Team>, team::Id>>,
            Ok = Option<Team>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Err = Traced<database::Error>,
        >
        + Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUser {
            user_id,
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
        let demotes = role.is_some_and(|r| r != user::Role::Admin);
        if user_id == initiator_id && demotes {
            return Err(tracerr::new!(E::SelfDemotion(initiator_id)));
        }

        if let Some(Some(id)) = team_id {
            _ = self
                .database()
                .execute(Select(By::<Option<Team>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .filter(|t| t.organization_id == initiator.organization_id)
                .ok_or(E::TeamNotExists(id))
                .map_err(tracerr::wrap!())?;
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut user = tx
            .execute(Select(By::<Option<User>, _>::new(user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|u| u.organization_id == initiator.organization_id)
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        if let Some(role) = role {
            user.role = role;
        }
        if let Some(team_id) = team_id {
            user.team_id = team_id;
        }

        tx.execute(Insert(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(user)
    }
}

/// Error of [`UpdateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`User`] is not an [`Role::Admin`].
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Role::Admin`] attempts to take away its own [`Role`], leaving the
    /// [`Organization`] potentially unmanaged.
    #[display("`User(id: {_0})` cannot demote itself")]
    SelfDemotion(#[error(not(source))] user::Id),

    /// [`Team`] with the provided ID does not exist.
    #[display("`Team(id: {_0})` does not exist")]
    TeamNotExists(#[error(not(source))] team::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
