//! [`Team`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{organization, team, Team},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Maps the provided [`Row`] into a [`Team`].
fn from_row(row: &Row) -> Team {
    Team {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Team>, team::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Team>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Team>, team::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, organization_id, name, created_at \
            FROM teams \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<'n, C>
    Database<Select<By<Option<Team>, (organization::Id, &'n team::Name)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Team>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<Option<Team>, (organization::Id, &'n team::Name)>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, name) = by.into_inner();

        const SQL: &str = "\
            SELECT id, organization_id, name, created_at \
            FROM teams \
            WHERE organization_id = $1::UUID \
              AND LOWER(name) = LOWER($2::VARCHAR)";
        Ok(self
            .query_opt(SQL, &[&org_id, name])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Team>, organization::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Team>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Team>, organization::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let org_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, organization_id, name, created_at \
            FROM teams \
            WHERE organization_id = $1::UUID \
            ORDER BY name";
        Ok(self
            .query(SQL, &[&org_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Team>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(team): Insert<Team>,
    ) -> Result<Self::Ok, Self::Err> {
        let Team {
            id,
            organization_id,
            name,
            created_at,
        } = team;

        const SQL: &str = "\
            INSERT INTO teams (id, organization_id, name, created_at) \
            VALUES ($1::UUID, $2::UUID, $3::VARCHAR, $4::TIMESTAMPTZ)";
        self.exec(SQL, &[&id, &organization_id, &name, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
