//! Currency [`Rates`] and conversion between currencies.

use std::collections::BTreeMap;

#[cfg(doc)]
use common::DateTime;
use common::{money, unit, Currency, DateTimeOf};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places a derived conversion rate is rounded to.
pub const RATE_SCALE: u32 = 6;

/// Snapshot of exchange rates relative to an anchor [`Currency`].
///
/// A rate tells how many units of a [`Currency`] one unit of the anchor
/// buys, so the anchor itself always has the rate of `1`.
///
/// [`Rates`] are lenient: any [`Currency`] missing from the snapshot is
/// treated as having the rate of `1`, so an unknown or a not yet fetched
/// currency never fails a computation.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rates {
    /// Anchor [`Currency`] of these [`Rates`].
    anchor: Currency,

    /// Known rates, each strictly positive.
    table: BTreeMap<Currency, Decimal>,

    /// [`DateTime`] when these [`Rates`] were fetched from the provider, if
    /// they were.
    fetched_at: Option<FetchDateTime>,
}

impl Rates {
    /// Creates new [`Rates`] anchored at the provided [`Currency`].
    ///
    /// Non-positive rates are dropped, as they cannot be divided by.
    #[must_use]
    pub fn new(
        anchor: Currency,
        rates: impl IntoIterator<Item = (Currency, Decimal)>,
    ) -> Self {
        let mut table = rates
            .into_iter()
            .filter(|(_, rate)| *rate > Decimal::ZERO)
            .collect::<BTreeMap<_, _>>();
        _ = table.insert(anchor, Decimal::ONE);
        Self {
            anchor,
            table,
            fetched_at: None,
        }
    }

    /// Marks these [`Rates`] as fetched at the provided [`DateTime`].
    #[must_use]
    pub fn fetched_at(mut self, at: FetchDateTime) -> Self {
        self.fetched_at = Some(at);
        self
    }

    /// Returns the anchor [`Currency`] of these [`Rates`].
    #[must_use]
    pub fn anchor(&self) -> Currency {
        self.anchor
    }

    /// Returns [`DateTime`] when these [`Rates`] were fetched, if they were.
    #[must_use]
    pub fn fetch_date(&self) -> Option<FetchDateTime> {
        self.fetched_at
    }

    /// Iterates over all the known rates.
    pub fn iter(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        self.table.iter().map(|(c, r)| (*c, *r))
    }

    /// Returns the rate of the provided [`Currency`], or `1` if it's unknown.
    #[must_use]
    pub fn rate(&self, currency: Currency) -> Decimal {
        self.table.get(&currency).copied().unwrap_or(Decimal::ONE)
    }

    /// Converts the provided `amount` between currencies, rounding the result
    /// to cents.
    ///
    /// [`None`] if the result overflows [`Decimal`].
    #[must_use]
    pub fn convert(
        &self,
        amount: Decimal,
        from: Currency,
        to: Currency,
    ) -> Option<Decimal> {
        if from == to {
            return Some(money::round(amount));
        }
        amount
            .checked_mul(self.rate(to))?
            .checked_div(self.rate(from))
            .map(money::round)
    }

    /// Derives the rate converting `from` one [`Currency`] `to` another,
    /// rounded to [`RATE_SCALE`] decimal places.
    ///
    /// [`None`] if the rate overflows [`Decimal`].
    #[must_use]
    pub fn derive_rate(
        &self,
        from: Currency,
        to: Currency,
    ) -> Option<Decimal> {
        self.rate(to).checked_div(self.rate(from)).map(round_rate)
    }

    /// Re-expresses these [`Rates`] relative to another anchor [`Currency`].
    ///
    /// An unknown `anchor` has the rate of `1`, so the rates are kept as is
    /// apart from the `anchor` itself becoming `1`. Rates overflowing
    /// [`Decimal`] are dropped, so they fall back to `1` as well.
    #[must_use]
    pub fn anchored_at(&self, anchor: Currency) -> Self {
        let base = self.rate(anchor);
        Self {
            fetched_at: self.fetched_at,
            ..Self::new(
                anchor,
                self.iter().filter_map(|(c, r)| {
                    r.checked_div(base).map(|r| (c, round_rate(r)))
                }),
            )
        }
    }
}

/// Rounds the provided `rate` to [`RATE_SCALE`] decimal places.
fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(
        RATE_SCALE,
        RoundingStrategy::MidpointAwayFromZero,
    )
    .normalize()
}

/// Marker type describing the moment [`Rates`] are fetched.
#[derive(Clone, Copy, Debug)]
pub struct Fetch;

/// [`DateTime`] when [`Rates`] were fetched from the provider.
pub type FetchDateTime = DateTimeOf<(Rates, Fetch)>;

/// [`DateTime`] when [`Rates`] were stored.
pub type CreationDateTime = DateTimeOf<(Rates, unit::Creation)>;

/// Selector of the latest [`Rates`] snapshot stored by the provider.
#[derive(Clone, Copy, Debug)]
pub struct Latest;

#[cfg(test)]
mod spec {
    use common::Currency;
    use rust_decimal::Decimal;

    use super::Rates;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn currency(s: &str) -> Currency {
        s.parse().unwrap()
    }

    fn rates() -> Rates {
        Rates::new(
            currency("NPR"),
            [
                (currency("USD"), decimal("0.0075")),
                (currency("EUR"), decimal("0.0069")),
                (currency("INR"), decimal("0.625")),
            ],
        )
    }

    #[test]
    fn converts_base_to_target() {
        let rates = rates();

        assert_eq!(
            rates.convert(decimal("1000"), currency("NPR"), currency("USD")),
            Some(decimal("7.50")),
        );
        assert_eq!(
            rates.derive_rate(currency("NPR"), currency("USD")),
            Some(decimal("0.0075")),
        );
    }

    #[test]
    fn converts_between_non_anchor_currencies() {
        let rates = rates();

        // 100 USD = 13333.33.. NPR = 8333.33.. INR
        assert_eq!(
            rates.convert(decimal("100"), currency("USD"), currency("INR")),
            Some(decimal("8333.33")),
        );
    }

    #[test]
    fn round_trips_within_a_cent() {
        let rates = rates();
        let (npr, usd, eur) =
            (currency("NPR"), currency("USD"), currency("EUR"));

        for amount in ["1000", "1234.56", "0.99", "99999.99"] {
            let x = decimal(amount);
            for (a, b) in [(npr, usd), (usd, eur), (eur, npr)] {
                let there = rates.convert(x, a, b).unwrap();
                let back = rates.convert(there, b, a).unwrap();
                let tolerance = rates
                    .convert(decimal("0.01"), b, a)
                    .unwrap()
                    .max(decimal("0.01"));
                assert!(
                    (back - x).abs() <= tolerance,
                    "{x} {a} -> {b} -> {a} = {back}",
                );
            }
        }
    }

    #[test]
    fn unknown_currency_has_rate_of_one() {
        let rates = rates();
        let xyz = currency("XYZ");

        assert_eq!(rates.rate(xyz), Decimal::ONE);
        assert_eq!(
            rates.convert(decimal("50"), currency("USD"), xyz),
            Some(decimal("6666.67")),
        );
        assert_eq!(
            rates.convert(decimal("50"), xyz, currency("NPR")),
            Some(decimal("50.00")),
        );
    }

    #[test]
    fn drops_non_positive_rates() {
        let rates = Rates::new(
            currency("USD"),
            [
                (currency("EUR"), Decimal::ZERO),
                (currency("GBP"), decimal("-1")),
            ],
        );

        assert_eq!(rates.rate(currency("EUR")), Decimal::ONE);
        assert_eq!(rates.rate(currency("GBP")), Decimal::ONE);
        assert_eq!(rates.iter().count(), 1);
    }

    #[test]
    fn reanchors() {
        let rates = rates().anchored_at(currency("USD"));

        assert_eq!(rates.anchor(), currency("USD"));
        assert_eq!(rates.rate(currency("USD")), Decimal::ONE);
        assert_eq!(rates.rate(currency("NPR")), decimal("133.333333"));
        assert_eq!(rates.rate(currency("EUR")), decimal("0.92"));
    }

    #[test]
    fn overflow_degrades_instead_of_panicking() {
        let tiny = decimal("0.0000000000000000000000000001");
        let rates = Rates::new(
            currency("USD"),
            [(currency("AAA"), tiny), (currency("BBB"), Decimal::MAX)],
        );
        let (aaa, bbb) = (currency("AAA"), currency("BBB"));

        assert_eq!(rates.derive_rate(aaa, bbb), None);
        assert_eq!(rates.convert(Decimal::MAX, currency("USD"), bbb), None);

        let reanchored = rates.anchored_at(aaa);
        assert_eq!(reanchored.rate(aaa), Decimal::ONE);
        assert_eq!(reanchored.rate(bbb), Decimal::ONE);
    }
}
