//! [`Payment`]-related [`Database`] implementations.

use common::operations::{By, Delete, Insert, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{deal, payment, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Maps the provided [`Row`] into a [`Payment`].
fn from_row(row: &Row) -> Payment {
    let status = payment::Status::from_parts(
        row.get("status"),
        row.get("reviewed_by"),
        row.get("reviewed_at"),
        row.get("denial_remarks"),
    )
    .expect("guarded by `payments_review_consistent` constraint");
    Payment {
        id: row.get("id"),
        deal_id: row.get("deal_id"),
        amount: row.get("amount"),
        payment_date: row.get("payment_date"),
        receipt: row.get("receipt"),
        remarks: row.get("remarks"),
        status,
        is_edited: row.get("is_edited"),
        created_at: row.get("created_at"),
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            SELECT id, deal_id, amount, payment_date, receipt, remarks, \
                   status, reviewed_by, reviewed_at, denial_remarks, \
                   is_edited, created_at \
            FROM payments \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<Vec<Payment>, deal::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, deal::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let deal_id = by.into_inner();

        const SQL: &str = "\
            SELECT id, deal_id, amount, payment_date, receipt, remarks, \
                   status, reviewed_by, reviewed_at, denial_remarks, \
                   is_edited, created_at \
            FROM payments \
            WHERE deal_id = $1::UUID \
            ORDER BY payment_date, id";
        Ok(self
            .query(SQL, &[&deal_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Payment>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(payment)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            deal_id,
            amount,
            payment_date,
            receipt,
            remarks,
            status,
            is_edited,
            created_at,
        } = payment;
        let (kind, reviewed_by, reviewed_at, denial_remarks) = (
            status.kind(),
            status.reviewed_by(),
            status.reviewed_at(),
            status.denial_remarks(),
        );

        const SQL: &str = "\
            INSERT INTO payments (\
                id, deal_id, amount, payment_date, receipt, remarks, \
                status, reviewed_by, reviewed_at, denial_remarks, \
                is_edited, created_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::NUMERIC, $4::TIMESTAMPTZ, \
                $5::VARCHAR, $6::TEXT, \
                $7::INT2, $8::UUID, $9::TIMESTAMPTZ, $10::TEXT, \
                $11::BOOLEAN, $12::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET amount = EXCLUDED.amount, \
                payment_date = EXCLUDED.payment_date, \
                receipt = EXCLUDED.receipt, \
                remarks = EXCLUDED.remarks, \
                status = EXCLUDED.status, \
                reviewed_by = EXCLUDED.reviewed_by, \
                reviewed_at = EXCLUDED.reviewed_at, \
                denial_remarks = EXCLUDED.denial_remarks, \
                is_edited = EXCLUDED.is_edited";
        self.exec(
            SQL,
            &[
                &id,
                &deal_id,
                &amount,
                &payment_date,
                &receipt,
                &remarks,
                &kind,
                &reviewed_by,
                &reviewed_at,
                &denial_remarks,
                &is_edited,
                &created_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM payments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
