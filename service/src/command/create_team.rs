//! [`Command`] for creating a new [`Team`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{user::Role, Organization};
use crate::{
    domain::{organization, team, user, Team, User},
    infra::{database, Database},
    Service,
};

use super::{on_unique_violation, Command};

/// [`Command`] for creating a new [`Team`] in the [`Organization`] of its
/// initiator.
#[derive(Clone, Debug)]
pub struct CreateTeam {
    /// [`team::Name`] of a new [`Team`].
    pub name: team::Name,

    /// ID of the [`User`] who creates a new [`Team`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateTeam> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<By<Option<Team>, (organization::Id, &'n team::Name)>>,
            Ok = Option<Team>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Team>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Team;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateTeam) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateTeam { name, initiator_id } = cmd;

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

        let occupied = self
            .database()
            .execute(Select(By::<Option<Team>, _>::new((
                initiator.organization_id,
                &name,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let team = Team {
            id: team::Id::new(),
            organization_id: initiator.organization_id,
            name,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(team.clone()))
            .await
            .map_err(on_unique_violation("teams_name_unique", || {
                E::NameOccupied(team.name.clone())
            }))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(team)
    }
}

/// Error of [`CreateTeam`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`team::Name`] is already occupied in the [`Organization`].
    #[display("`{_0}` team name is occupied")]
    NameOccupied(#[error(not(source))] team::Name),

    /// [`User`] is not an [`Role::Admin`].
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
