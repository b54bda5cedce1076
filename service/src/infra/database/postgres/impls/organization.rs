//! [`Organization`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{organization, Organization},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Maps the provided [`Row`] into an [`Organization`].
fn from_row(row: &Row) -> Organization {
    Organization {
        id: row.get("id"),
        name: row.get("name"),
        currency: row.get("currency"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Organization>, organization::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Organization>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Organization>, organization::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, name, currency, created_at \
            FROM organizations \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Insert<Organization>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(org): Insert<Organization>,
    ) -> Result<Self::Ok, Self::Err> {
        let Organization {
            id,
            name,
            currency,
            created_at,
        } = org;

        const SQL: &str = "\
            INSERT INTO organizations (id, name, currency, created_at) \
            VALUES ($1::UUID, $2::VARCHAR, $3::VARCHAR, $4::TIMESTAMPTZ)";
        self.exec(SQL, &[&id, &name, &currency, &created_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
