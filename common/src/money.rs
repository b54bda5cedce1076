//! [`Currency`] and monetary amounts.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{fmt, str::FromStr};

#[cfg(feature = "postgres")]
use postgres_types::{
    private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use rust_decimal::{Decimal, RoundingStrategy};

/// Number of decimal places every monetary figure is rounded to.
pub const SCALE: u32 = 2;

/// Largest monetary amount a `NUMERIC(20, 2)` column stores.
pub const MAX: Decimal =
    Decimal::from_parts(1_661_992_959, 1_808_227_885, 5, false, SCALE);

/// Rounds the provided monetary `amount` to [`SCALE`] decimal places, with
/// midpoints rounded away from zero.
#[must_use]
pub fn round(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// [ISO 4217] alphabetic code of a currency (`USD`, `NPR`, `EUR`, ...).
///
/// Any three ASCII letters are accepted, so rates for currencies unknown at
/// compile time can still be served. The code is always stored uppercased.
///
/// [ISO 4217]: https://en.wikipedia.org/wiki/ISO_4217
#[derive(Clone, Copy, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Currency([u8; 3]);

impl Currency {
    /// United States dollar.
    pub const USD: Self = Self(*b"USD");

    /// Creates a new [`Currency`] out of the provided code, if it consists of
    /// exactly three ASCII letters.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        let bytes = code.as_ref().as_bytes();
        let code: [u8; 3] = bytes.try_into().ok()?;
        code.iter()
            .all(u8::is_ascii_alphabetic)
            .then(|| Self(code.map(|b| b.to_ascii_uppercase())))
    }

    /// Returns the code of this [`Currency`].
    #[must_use]
    pub fn code(&self) -> String {
        self.0.iter().copied().map(char::from).collect()
    }
}

impl fmt::Debug for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Currency({self})")
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0
            .iter()
            .try_for_each(|b| fmt::Write::write_char(f, char::from(*b)))
    }
}

impl FromStr for Currency {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid currency code")
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Currency {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Currency {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let code = <std::borrow::Cow<'de, str>>::deserialize(d)?;
        Self::new(code.as_ref()).ok_or_else(|| {
            serde::de::Error::custom(format!("invalid currency code: {code}"))
        })
    }
}

#[cfg(feature = "postgres")]
impl FromSql<'_> for Currency {
    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let code = <&str>::from_sql(ty, raw)?;
        Self::new(code)
            .ok_or_else(|| format!("invalid `Currency` value: {code}").into())
    }

    fn accepts(ty: &Type) -> bool {
        <&str as FromSql<'_>>::accepts(ty)
    }
}

#[cfg(feature = "postgres")]
impl ToSql for Currency {
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.code().as_str().to_sql(ty, w)
    }

    fn accepts(ty: &Type) -> bool {
        <&str as ToSql>::accepts(ty)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Three-letter ISO 4217 currency code (`USD`, `NPR`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Currency = super::Currency;

    impl Currency {
        fn to_output<S: ScalarValue>(c: &Currency) -> Value<S> {
            Value::scalar(c.code())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Currency` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Currency` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{round, Currency, MAX};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn currency(s: &str) -> Currency {
        s.parse().unwrap()
    }

    #[test]
    fn currency_is_normalized() {
        assert_eq!(currency("npr"), currency("NPR"));
        assert_eq!(currency("Usd"), Currency::USD);
        assert_eq!(currency("eur").to_string(), "EUR");
        assert_eq!(currency("eur").code(), "EUR");

        assert!(Currency::from_str("US").is_err());
        assert!(Currency::from_str("USDT").is_err());
        assert!(Currency::from_str("U5D").is_err());
        assert!(Currency::from_str("").is_err());
    }

    #[test]
    fn max_fits_numeric_20_2() {
        assert_eq!(MAX.to_string(), "999999999999999999.99");
        assert_eq!(round(MAX), MAX);
    }

    #[test]
    fn rounds_midpoint_away_from_zero() {
        assert_eq!(round(decimal("7.505")), decimal("7.51"));
        assert_eq!(round(decimal("7.504")), decimal("7.50"));
        assert_eq!(round(decimal("-0.125")), decimal("-0.13"));
        assert_eq!(round(decimal("13.25")), decimal("13.25"));
        assert_eq!(round(decimal("2.675")), decimal("2.68"));
    }
}
