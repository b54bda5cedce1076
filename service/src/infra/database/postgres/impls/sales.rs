//! Sales aggregation inputs [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Select};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        deal, payment,
        sales::{Attribution, Collection, Installment, Sale, Selector},
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Maps the provided [`Row`] into an [`Attribution`].
fn attribution(row: &Row) -> Attribution {
    Attribution {
        user_id: row.get("user_id"),
        team_id: row.get("team_id"),
        work_type_id: row.get("work_type_id"),
        source_type_id: row.get("source_type_id"),
    }
}

impl<C> Database<Select<By<Vec<Sale>, Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Sale>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Sale>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Selector {
            organization_id,
            interval,
            scope,
        } = by.into_inner();
        let (start, end) = (interval.start(), interval.end());

        const DEALS_SQL: &str = "\
            SELECT d.id, d.value, d.deal_date, \
                   d.user_id, u.team_id, d.work_type_id, d.source_type_id \
            FROM deals AS d \
            INNER JOIN users AS u ON u.id = d.user_id \
            WHERE d.organization_id = $1::UUID \
              AND d.deal_date >= $2::TIMESTAMPTZ \
              AND d.deal_date < $3::TIMESTAMPTZ \
              AND ($4::UUID IS NULL OR d.user_id = $4::UUID) \
              AND ($5::UUID IS NULL OR u.team_id = $5::UUID)";
        let deals = self
            .query(
                DEALS_SQL,
                &[
                    &organization_id,
                    &start,
                    &end,
                    &scope.user_id,
                    &scope.team_id,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?;
        if deals.is_empty() {
            return Ok(vec![]);
        }

        let ids = deals
            .iter()
            .map(|row| row.get("id"))
            .collect::<Vec<deal::Id>>();

        const PAYMENTS_SQL: &str = "\
            SELECT deal_id, amount, status \
            FROM payments \
            WHERE deal_id = ANY($1::UUID[])";
        let mut installments = HashMap::<deal::Id, Vec<Installment>>::new();
        for row in self
            .query(PAYMENTS_SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
        {
            installments
                .entry(row.get("deal_id"))
                .or_default()
                .push(Installment {
                    amount: row.get("amount"),
                    status: row.get("status"),
                });
        }

        Ok(deals
            .iter()
            .map(|row| {
                let deal_id = row.get("id");
                Sale {
                    deal_id,
                    value: row.get("value"),
                    deal_date: row.get("deal_date"),
                    attribution: attribution(row),
                    installments: installments
                        .remove(&deal_id)
                        .unwrap_or_default(),
                }
            })
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Collection>, Selector>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Collection>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Collection>, Selector>>,
    ) -> Result<Self::Ok, Self::Err> {
        let Selector {
            organization_id,
            interval,
            scope,
        } = by.into_inner();
        let (start, end) = (interval.start(), interval.end());
        let verified = payment::StatusKind::Verified;

        const SQL: &str = "\
            SELECT p.amount, p.payment_date, \
                   d.user_id, u.team_id, d.work_type_id, d.source_type_id \
            FROM payments AS p \
            INNER JOIN deals AS d ON d.id = p.deal_id \
            INNER JOIN users AS u ON u.id = d.user_id \
            WHERE d.organization_id = $1::UUID \
              AND p.status = $2::INT2 \
              AND p.payment_date >= $3::TIMESTAMPTZ \
              AND p.payment_date < $4::TIMESTAMPTZ \
              AND ($5::UUID IS NULL OR d.user_id = $5::UUID) \
              AND ($6::UUID IS NULL OR u.team_id = $6::UUID)";
        Ok(self
            .query(
                SQL,
                &[
                    &organization_id,
                    &verified,
                    &start,
                    &end,
                    &scope.user_id,
                    &scope.team_id,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| Collection {
                amount: row.get("amount"),
                payment_date: row.get("payment_date"),
                attribution: attribution(row),
            })
            .collect())
    }
}
