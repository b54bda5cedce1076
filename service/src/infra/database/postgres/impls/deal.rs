//! [`Deal`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Lock, Select, Update};
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{deal, Deal},
    infra::{
        database::{
            self,
            postgres::{Connection, FuzzPattern},
            Postgres,
        },
        Database,
    },
    read,
};

/// Maps the provided [`Row`] into a [`Deal`].
fn from_row(row: &Row) -> Deal {
    Deal {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        user_id: row.get("user_id"),
        client: row.get("client"),
        work_type_id: row.get("work_type_id"),
        source_type_id: row.get("source_type_id"),
        value: row.get("value"),
        deal_date: row.get("deal_date"),
        due_date: row.get("due_date"),
        remarks: row.get("remarks"),
        is_edited: row.get("is_edited"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Deal>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Deal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Deal>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, organization_id, user_id, client, \
                   work_type_id, source_type_id, value, \
                   deal_date, due_date, remarks, \
                   is_edited, created_at \
            FROM deals \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Deal>, read::deal::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Deal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Deal>, read::deal::list::Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::deal::list::Selector {
            organization_id,
            interval,
            scope,
            client,
        } = by.into_inner();
        let (start, end) = (interval.start(), interval.end());

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![
            &organization_id,
            &start,
            &end,
            &scope.user_id,
            &scope.team_id,
        ];

        let pattern = client.as_ref().map(|c| FuzzPattern::new(c.as_ref()));
        let client_filtering = pattern.as_ref().map_or_else(String::new, |p| {
            ps.push(p);
            format!(
                "AND LOWER(d.client) SIMILAR TO ${}::VARCHAR",
                ps.len(),
            )
        });

        let sql = format!(
            "SELECT d.id, d.organization_id, d.user_id, d.client, \
                    d.work_type_id, d.source_type_id, d.value, \
                    d.deal_date, d.due_date, d.remarks, \
                    d.is_edited, d.created_at \
             FROM deals AS d \
             INNER JOIN users AS u ON u.id = d.user_id \
             WHERE d.organization_id = $1::UUID \
               AND d.deal_date >= $2::TIMESTAMPTZ \
               AND d.deal_date < $3::TIMESTAMPTZ \
               AND ($4::UUID IS NULL OR d.user_id = $4::UUID) \
               AND ($5::UUID IS NULL OR u.team_id = $5::UUID) \
               {client_filtering} \
             ORDER BY d.deal_date DESC, d.id",
        );
        Ok(self
            .query(&sql, ps.as_slice())
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Deal>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Deal>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(deal): Insert<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(deal)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Deal>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(deal): Update<Deal>,
    ) -> Result<Self::Ok, Self::Err> {
        let Deal {
            id,
            organization_id,
            user_id,
            client,
            work_type_id,
            source_type_id,
            value,
            deal_date,
            due_date,
            remarks,
            is_edited,
            created_at,
        } = deal;

        const SQL: &str = "\
            INSERT INTO deals (\
                id, organization_id, user_id, client, \
                work_type_id, source_type_id, value, \
                deal_date, due_date, remarks, \
                is_edited, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::VARCHAR, \
                $5::UUID, $6::UUID, $7::NUMERIC, \
                $8::TIMESTAMPTZ, $9::TIMESTAMPTZ, $10::TEXT, \
                $11::BOOLEAN, $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET user_id = EXCLUDED.user_id, \
                client = EXCLUDED.client, \
                work_type_id = EXCLUDED.work_type_id, \
                source_type_id = EXCLUDED.source_type_id, \
                value = EXCLUDED.value, \
                deal_date = EXCLUDED.deal_date, \
                due_date = EXCLUDED.due_date, \
                remarks = EXCLUDED.remarks, \
                is_edited = EXCLUDED.is_edited";
        self.exec(
            SQL,
            &[
                &id,
                &organization_id,
                &user_id,
                &client,
                &work_type_id,
                &source_type_id,
                &value,
                &deal_date,
                &due_date,
                &remarks,
                &is_edited,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Deal, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Deal, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM deals \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Deal, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Deal, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            INSERT INTO deals_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
