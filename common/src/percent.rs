//! [`Percent`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;

/// Percentage in the `0..=100` range.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Percent(Decimal);

impl Percent {
    /// Creates a new [`Percent`] by checking the provided value lies in the
    /// `0..=100` range.
    #[must_use]
    pub fn new(val: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Decimal::ONE_HUNDRED)
            .contains(&val)
            .then_some(Self(val))
    }

    /// Returns the value of this [`Percent`] (`12.5` for `12.5%`).
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }

    /// Applies this [`Percent`] to the provided `amount`.
    ///
    /// [`None`] if the result overflows [`Decimal`].
    #[must_use]
    pub fn of(self, amount: Decimal) -> Option<Decimal> {
        amount
            .checked_mul(self.0)?
            .checked_div(Decimal::ONE_HUNDRED)
    }
}

impl FromStr for Percent {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim_end_matches('%'))
            .ok()
            .and_then(Self::new)
            .ok_or("invalid percent value")
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Percentage from `0` to `100`, as a decimal string (`"12.5"`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Percent = super::Percent;

    impl Percent {
        fn to_output<S: ScalarValue>(m: &Percent) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Percent` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Percent` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Percent;

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn accepts_bounds_inclusively() {
        assert_eq!(
            Percent::new(Decimal::ZERO).map(Percent::value),
            Some(Decimal::ZERO),
        );
        assert!(Percent::new(Decimal::ONE_HUNDRED).is_some());

        assert!(Percent::new(decimal("-0.01")).is_none());
        assert!(Percent::new(decimal("100.01")).is_none());
    }

    #[test]
    fn parses_with_optional_sign() {
        assert_eq!("10".parse::<Percent>().unwrap().value(), decimal("10"));
        assert_eq!(
            "12.5%".parse::<Percent>().unwrap().value(),
            decimal("12.5"),
        );
        assert!("ten".parse::<Percent>().is_err());
        assert!("101".parse::<Percent>().is_err());
    }

    #[test]
    fn applies_to_amount() {
        let p: Percent = "10".parse().unwrap();

        assert_eq!(p.of(decimal("7.5")), Some(decimal("0.75")));
        assert_eq!(
            Percent::new(Decimal::ZERO).unwrap().of(decimal("7.5")),
            Some(Decimal::ZERO),
        );
    }

    #[test]
    fn overflow_is_none() {
        let p = Percent::new(Decimal::ONE_HUNDRED).unwrap();

        assert_eq!(p.of(Decimal::MAX), None);
    }
}
