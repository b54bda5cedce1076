//! In-band operation outcome definitions.
//!
//! Business failures of the sales operations are reported as data rather
//! than as GraphQL errors, so clients can render them next to the inputs
//! they relate to.

use juniper::GraphQLObject;
use service::domain::period;
use tracing as log;

use crate::Error;

/// Outcome of an operation.
#[derive(Clone, Debug, GraphQLObject)]
pub struct Status {
    /// Indicator whether the operation succeeded.
    pub success: bool,

    /// Machine-readable code of the failure, if any.
    pub code: Option<String>,

    /// Human-readable description of the outcome.
    pub message: String,

    /// Input fields the failure relates to.
    pub field_errors: Vec<FieldError>,
}

impl Status {
    /// Creates a successful [`Status`] with the provided `message`.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: None,
            message: message.into(),
            field_errors: vec![],
        }
    }
}

impl From<Failure> for Status {
    fn from(failure: Failure) -> Self {
        let Failure {
            code,
            message,
            field_errors,
        } = failure;
        Self {
            success: false,
            code: Some(code),
            message,
            field_errors,
        }
    }
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        Failure::from(err).into()
    }
}

/// Failed outcome of an operation.
#[derive(Clone, Debug, GraphQLObject)]
pub struct Failure {
    /// Machine-readable code of this `Failure`.
    pub code: String,

    /// Human-readable description of this `Failure`.
    pub message: String,

    /// Input fields this `Failure` relates to.
    pub field_errors: Vec<FieldError>,
}

impl Failure {
    /// Creates a new [`Failure`] out of the provided [`Error`] and the input
    /// fields it relates to.
    ///
    /// Internal [`Error`]s are logged and replaced with a generic message.
    #[must_use]
    pub fn new(err: Error, field_errors: Vec<FieldError>) -> Self {
        if err.is_internal() {
            log::error!("operation failed: {err}");
            return Self {
                code: Error::INTERNAL.into(),
                message: "Internal server error".into(),
                field_errors: vec![],
            };
        }
        Self {
            code: err.code.into(),
            message: err.message,
            field_errors,
        }
    }
}

impl Failure {
    /// Creates a new `VALIDATION_ERROR` [`Failure`] of the provided invalid
    /// input fields.
    #[must_use]
    pub fn invalid(field_errors: Vec<FieldError>) -> Self {
        Self {
            code: Error::VALIDATION.into(),
            message: "Invalid input".into(),
            field_errors,
        }
    }
}

impl From<Error> for Failure {
    fn from(err: Error) -> Self {
        Self::new(err, vec![])
    }
}

/// Validation failure of a single input field.
#[derive(Clone, Debug, GraphQLObject)]
pub struct FieldError {
    /// Name of the input field.
    pub field: String,

    /// What is wrong with the field.
    pub message: String,
}

impl FieldError {
    /// Returns the [`FieldError`]s the provided [`period::Error`] relates to.
    #[must_use]
    pub fn of_period(err: &period::Error) -> Vec<Self> {
        use period::{DateField as F, Error as E};

        let fields = match err {
            E::InvalidDateFormat(field) => vec![*field],
            E::MissingDates => vec![F::StartDate, F::EndDate],
            E::InvertedRange => vec![F::StartDate],
            E::OutOfRange => vec![],
        };
        fields
            .into_iter()
            .map(|field| Self {
                field: field.to_string(),
                message: err.to_string(),
            })
            .collect()
    }
}

/// Collector of [`FieldError`]s of the raw inputs being validated.
#[derive(Debug, Default)]
pub struct Validation(Vec<FieldError>);

impl Validation {
    /// Records a [`FieldError`] of the `field` if its `value` is invalid.
    pub fn check<T>(
        &mut self,
        field: impl Into<String>,
        value: Option<T>,
        message: &str,
    ) -> Option<T> {
        if value.is_none() {
            self.0.push(FieldError {
                field: field.into(),
                message: message.into(),
            });
        }
        value
    }

    /// Completes this [`Validation`] with the validated `value`.
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` [`Failure`] if any of the checks failed.
    pub fn finish<T>(self, value: Option<T>) -> Result<T, Failure> {
        match value {
            Some(v) if self.0.is_empty() => Ok(v),
            _ => Err(Failure::invalid(self.0)),
        }
    }
}

#[cfg(test)]
mod spec {
    use service::domain::period;

    use crate::Error;

    use super::{FieldError, Status, Validation};

    #[test]
    fn internal_error_message_is_hidden() {
        let status = Status::from(Error::internal(&"connection refused"));

        assert!(!status.success);
        assert_eq!(status.code.as_deref(), Some("INTERNAL_SERVER_ERROR"));
        assert_eq!(status.message, "Internal server error");
    }

    #[test]
    fn inverted_range_points_at_start_date() {
        let errors = FieldError::of_period(&period::Error::InvertedRange);

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "startDate");
    }

    #[test]
    fn missing_dates_point_at_both_dates() {
        let fields = FieldError::of_period(&period::Error::MissingDates)
            .into_iter()
            .map(|e| e.field)
            .collect::<Vec<_>>();

        assert_eq!(fields, ["startDate", "endDate"]);
    }

    #[test]
    fn validation_collects_every_invalid_field() {
        let mut v = Validation::default();
        let a = v.check("amount", None::<u8>, "must be positive");
        let b = v.check("bonus", Some(1), "must not be negative");
        let c = v.check("rate", None::<u8>, "must be positive");

        let failure = v.finish(a.zip(b).zip(c)).unwrap_err();

        assert_eq!(failure.code, "VALIDATION_ERROR");
        let fields = failure
            .field_errors
            .into_iter()
            .map(|e| e.field)
            .collect::<Vec<_>>();
        assert_eq!(fields, ["amount", "rate"]);
    }

    #[test]
    fn validation_passes_valid_value() {
        let mut v = Validation::default();
        let a = v.check("amount", Some(5), "must be positive");

        assert_eq!(v.finish(a).unwrap(), 5);
    }
}
