//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use derive_more::{AsRef, Display, From, Into};
use juniper::{
    GraphQLScalar, GraphQLType, InputValue, ParseScalarResult,
    ParseScalarValue, ScalarToken, ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Uses [`FromStr`]/[`Display`] impls of `As` type to convert the target type
/// to/from GraphQL scalar.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Convert the target type into scalar [`Value`] by using [`Display`] impl
    /// of `As` type.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from scalar [`Value`] by using [`FromStr`]
    /// impl of `As` type.
    ///
    /// Numeric inputs are accepted along with strings, so amounts may be
    /// provided either way.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - the input value is neither a string nor a number;
    /// - the input value cannot be parsed into `As` type;
    /// - the parsed value cannot be converted into the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr + fmt::Display,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("Scalar");
        let s = input
            .as_string_value()
            .map(ToOwned::to_owned)
            .or_else(|| input.as_int_value().map(|i| i.to_string()))
            .or_else(|| input.as_float_value().map(|f| f.to_string()))
            .ok_or_else(|| {
                format!(
                    "Cannot parse input scalar `{name}`: expected string or \
                     number input value, found: {input}",
                )
            })?;
        s.parse::<As>()
            .map_err(|e| {
                format!(
                    "Cannot parse input scalar `{name}` from \"{s}\": {e}",
                )
            })?
            .try_into()
            .map_err(|e| format!("Cannot parse input scalar `{name}`: {e}"))
    }

    /// Parse the provided [`ScalarToken`].
    ///
    /// # Errors
    ///
    /// Returns an error if the token is neither a string nor a number.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
            .or_else(|_| <f64 as ParseScalarValue<S>>::from_str(value))
    }
}

/// Arbitrary-precision decimal number, serialized as a string (`"1234.50"`)
/// to not lose precision on the way.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(with = Via::<rust_decimal::Decimal>)]
pub struct Decimal(rust_decimal::Decimal);

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};

    use super::{Decimal, Via};

    fn parse(input: &InputValue) -> Result<Decimal, String> {
        Via::<rust_decimal::Decimal>::from_input::<Decimal, DefaultScalarValue>(
            input,
        )
    }

    #[test]
    fn parses_decimal_from_string() {
        let d = parse(&InputValue::scalar("1234.50".to_owned())).unwrap();

        assert_eq!(d.to_string(), "1234.50");
    }

    #[test]
    fn parses_decimal_from_number() {
        assert_eq!(parse(&InputValue::scalar(12)).unwrap().to_string(), "12");
        assert_eq!(
            parse(&InputValue::scalar(12.5)).unwrap().to_string(),
            "12.5",
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse(&InputValue::scalar("12,5".to_owned())).is_err());
        assert!(parse(&InputValue::scalar(true)).is_err());
    }
}
