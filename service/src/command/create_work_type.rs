//! [`Command`] for creating a new [`WorkType`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    DateTime,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::{user::Role, Deal, Organization};
use crate::{
    domain::{
        classification::{self, work_type},
        organization, user, WorkType, User,
    },
    infra::{database, Database},
    Service,
};

use super::{on_unique_violation, Command};

/// [`Command`] for creating a new [`WorkType`] to classify [`Deal`]s with.
#[derive(Clone, Debug)]
pub struct CreateWorkType {
    /// [`classification::Name`] of a new [`WorkType`].
    pub name: classification::Name,

    /// ID of the [`User`] who creates a new [`WorkType`].
    pub initiator_id: user::Id,
}

impl<Db> Command<CreateWorkType> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'n> Database<
            Select<
                By<
                    Option<WorkType>,
                    (organization::Id, &'n classification::Name),
                >,
            >,
            Ok = Option<WorkType>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<WorkType>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = WorkType;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateWorkType,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateWorkType { name, initiator_id } = cmd;

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

        let occupied = self
            .database()
            .execute(Select(By::<Option<WorkType>, _>::new((
                initiator.organization_id,
                &name,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if occupied.is_some() {
            return Err(tracerr::new!(E::NameOccupied(name)));
        }

        let entity = WorkType {
            id: work_type::Id::new(),
            organization_id: initiator.organization_id,
            name,
            created_at: DateTime::now().coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(entity.clone()))
            .await
            .map_err(on_unique_violation("work_types_name_unique", || {
                E::NameOccupied(entity.name.clone())
            }))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(entity)
    }
}

/// Error of [`CreateWorkType`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`classification::Name`] is already occupied in the [`Organization`].
    #[display("`{_0}` work type is occupied")]
    NameOccupied(#[error(not(source))] classification::Name),

    /// [`User`] has neither [`Role::Admin`] nor [`Role::Supervisor`].
    #[display("`User(id: {_0})` is not privileged")]
    NotPrivileged(#[error(not(source))] user::Id),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}
