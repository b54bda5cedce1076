//! [`Commission`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        commission::{self, Figures, Month, State, Terms},
        organization, Commission,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Maps the provided [`Row`] into a saved [`Commission`].
fn from_row(row: &Row) -> Commission {
    Commission {
        id: row.get("id"),
        organization_id: row.get("organization_id"),
        user_id: row.get("user_id"),
        user_name: row.get("user_name"),
        month: row.get("month"),
        base_currency: row.get("base_currency"),
        terms: Terms {
            user_id: row.get("user_id"),
            currency: row.get("currency"),
            percent: row.get("percent"),
            bonus: row.get("bonus"),
            rate: row
                .get::<_, Option<Decimal>>("manual_rate")
                .and_then(commission::Rate::new),
        },
        exchange_rate: row.get("exchange_rate"),
        figures: Figures {
            total_sales: row.get("total_sales"),
            converted_amount: row.get("converted_amount"),
            commission_amount: row.get("commission_amount"),
            total_commission: row.get("total_commission"),
            total_received: row.get("total_received"),
        },
        state: State::Saved {
            saved_at: row.get("saved_at"),
        },
    }
}

impl<C> Database<Select<By<Vec<Commission>, (organization::Id, Month)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Commission>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Commission>, (organization::Id, Month)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, month) = by.into_inner();

        const SQL: &str = "\
            SELECT id, organization_id, user_id, user_name, month, \
                   base_currency, currency, percent, bonus, manual_rate, \
                   exchange_rate, total_sales, converted_amount, \
                   commission_amount, total_commission, total_received, \
                   saved_at \
            FROM commissions \
            WHERE organization_id = $1::UUID \
              AND month = $2::DATE \
            ORDER BY user_name, id";
        Ok(self
            .query(SQL, &[&org_id, &month])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect())
    }
}

impl<C> Database<Insert<Commission>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(commission): Insert<Commission>,
    ) -> Result<Self::Ok, Self::Err> {
        let Commission {
            id,
            organization_id,
            user_id,
            user_name,
            month,
            base_currency,
            terms,
            exchange_rate,
            figures,
            state,
        } = commission;
        let State::Saved { saved_at } = state else {
            // Drafts are never persisted.
            return Ok(());
        };
        let manual_rate = terms.rate.map(commission::Rate::value);

        const SQL: &str = "\
            INSERT INTO commissions (\
                id, organization_id, user_id, user_name, month, \
                base_currency, currency, percent, bonus, manual_rate, \
                exchange_rate, total_sales, converted_amount, \
                commission_amount, total_commission, total_received, \
                saved_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::VARCHAR, $5::DATE, \
                $6::VARCHAR, $7::VARCHAR, $8::NUMERIC, $9::NUMERIC, \
                $10::NUMERIC, \
                $11::NUMERIC, $12::NUMERIC, $13::NUMERIC, \
                $14::NUMERIC, $15::NUMERIC, $16::NUMERIC, \
                $17::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &organization_id,
                &user_id,
                &user_name,
                &month,
                &base_currency,
                &terms.currency,
                &terms.percent,
                &terms.bonus,
                &manual_rate,
                &exchange_rate,
                &figures.total_sales,
                &figures.converted_amount,
                &figures.commission_amount,
                &figures.total_commission,
                &figures.total_received,
                &saved_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Commission, (organization::Id, Month)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Commission, (organization::Id, Month)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (org_id, month) = by.into_inner();

        const SQL: &str = "\
            INSERT INTO commissions_lock (organization_id, month) \
            VALUES ($1::UUID, $2::DATE) \
            ON CONFLICT (organization_id, month) DO UPDATE \
            SET month = EXCLUDED.month";
        self.exec(SQL, &[&org_id, &month])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
