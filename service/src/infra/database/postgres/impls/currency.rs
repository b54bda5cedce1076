//! Currency [`Rates`]-related [`Database`] implementations.

use std::fmt;

use common::{
    operations::{By, Select},
    Currency,
};
use rust_decimal::Decimal;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::currency::{self, FetchDateTime, Rates},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Rates>, currency::Latest>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Rates>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Option<Rates>, currency::Latest>>,
    ) -> Result<Self::Ok, Self::Err> {
        const SQL: &str = "\
            SELECT anchor, currency, rate, fetched_at \
            FROM currency_rates \
            WHERE fetched_at = (\
                SELECT MAX(fetched_at) FROM currency_rates\
            )";
        let rows = self.query(SQL, &[]).await.map_err(tracerr::wrap!())?;

        let Some(first) = rows.first() else {
            return Ok(None);
        };
        let anchor = match first.try_get::<_, Currency>("anchor") {
            Ok(c) => c,
            Err(e) => {
                log::warn!("skipping `Rates` of unknown anchor: {e}");
                return Ok(None);
            }
        };
        let fetched_at: FetchDateTime = first.get("fetched_at");

        let rates = known(rows.iter().map(|row| {
            (
                row.try_get::<_, Currency>("currency"),
                row.try_get::<_, Decimal>("rate"),
            )
        }));
        Ok(Some(Rates::new(anchor, rates).fetched_at(fetched_at)))
    }
}

/// Filters out the rates failed to be decoded, logging them.
fn known<E: fmt::Display>(
    rows: impl IntoIterator<Item = (Result<Currency, E>, Result<Decimal, E>)>,
) -> impl Iterator<Item = (Currency, Decimal)> {
    rows.into_iter().filter_map(|row| match row {
        (Ok(currency), Ok(rate)) => Some((currency, rate)),
        (Err(e), _) | (_, Err(e)) => {
            log::warn!("skipping undecodable currency rate: {e}");
            None
        }
    })
}

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;

    use super::known;

    #[test]
    fn skips_unknown_currencies() {
        let eur = "EUR".parse::<Currency>().unwrap();
        let npr = "NPR".parse::<Currency>().unwrap();
        let rows = [
            (Ok(Currency::USD), Ok(Decimal::ONE)),
            (Err("unknown `Currency`: XAU"), Ok(Decimal::TWO)),
            (Ok(eur), Err("NULL rate")),
            (Ok(npr), Ok(Decimal::ONE_HUNDRED)),
        ];

        assert_eq!(
            known(rows).collect::<Vec<_>>(),
            [
                (Currency::USD, Decimal::ONE),
                (npr, Decimal::ONE_HUNDRED),
            ],
        );
    }
}
