//! [`User`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{organization, user, User},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Columns of the `users` table, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, organization_id, team_id, role, \
    name, login, password_hash, email, \
    created_at, deleted_at";

/// Maps the provided [`Row`] into a [`User`].
fn from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        team_id: row.get("team_id"),
        role: row.get("role"),
        name: row.get("name"),
        login: row.get("login"),
        password_hash: row.get("password_hash"),
        email: row.get("email"),
        created_at: row.get("created_at"),
        deleted_at: row.get("deleted_at"),
    }
}

impl<C> Database<Select<By<Option<User>, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE id = $1::UUID \
               AND deleted_at IS NULL",
        );
        Ok(self
            .query_opt(&sql, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'l, C> Database<Select<By<Option<User>, &'l user::Login>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Login>>,
    ) -> Result<Self::Ok, Self::Err> {
        let login = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE LOWER(login) = LOWER($1::VARCHAR) \
               AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[login])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'e, C>
    Database<Select<By<Option<User>, (organization::Id, &'e user::Email)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<User>, (organization::Id, &'e user::Email)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, email) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE organization_id = $1::UUID \
               AND LOWER(email) = LOWER($2::VARCHAR) \
               AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&org_id, email])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'n, C>
    Database<Select<By<Option<User>, (organization::Id, &'n user::Name)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<User>, (organization::Id, &'n user::Name)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, name) = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE organization_id = $1::UUID \
               AND LOWER(name) = LOWER($2::VARCHAR) \
               AND deleted_at IS NULL \
             LIMIT 1",
        );
        Ok(self
            .query_opt(&sql, &[&org_id, name])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<User>, organization::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<User>, organization::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let org_id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM users \
             WHERE organization_id = $1::UUID \
               AND deleted_at IS NULL \
             ORDER BY name",
        );
        Ok(self
            .query(&sql, &[&org_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<User>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(user)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<User>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let User {
            id,
            organization_id,
            team_id,
            role,
            name,
            login,
            password_hash,
            email,
            created_at,
            deleted_at,
        } = user;

        const SQL: &str = "\
            INSERT INTO users (\
                id, organization_id, team_id, role, \
                name, login, password_hash, email, \
                created_at, deleted_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::INT2, \
                $5::VARCHAR, $6::VARCHAR, $7::VARCHAR, $8::VARCHAR, \
                $9::TIMESTAMPTZ, $10::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET team_id = EXCLUDED.team_id, \
                role = EXCLUDED.role, \
                name = EXCLUDED.name, \
                login = EXCLUDED.login, \
                password_hash = EXCLUDED.password_hash, \
                email = EXCLUDED.email, \
                deleted_at = EXCLUDED.deleted_at";
        self.exec(
            SQL,
            &[
                &id,
                &organization_id,
                &team_id,
                &role,
                &name,
                &login,
                &password_hash,
                &email,
                &created_at,
                &deleted_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<User, user::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO users_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
