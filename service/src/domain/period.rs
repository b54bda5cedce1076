//! Resolution of symbolic [`Period`]s into concrete [`Interval`]s.
//!
//! All the calendar math happens in UTC.

use std::time::Duration;

use common::DateTime;
use derive_more::{Display, Error as StdError};
use strum::EnumString;
use time::{macros::format_description, Date, Month};

use crate::domain::{team, user, user::Role};
#[cfg(doc)]
use crate::domain::User;

/// Symbolic reporting period.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Period {
    /// Monday-aligned week containing "now".
    ThisWeek,

    /// Week preceding the [`Period::ThisWeek`].
    LastWeek,

    /// Calendar month containing "now".
    ThisMonth,

    /// Calendar month preceding the [`Period::ThisMonth`].
    LastMonth,

    /// Calendar year containing "now".
    ThisYear,

    /// Calendar year preceding the [`Period::ThisYear`].
    LastYear,

    /// Thirty days up to "now".
    LastThirty,

    /// Caller-provided range of whole days.
    CustomRange {
        /// First day of the range.
        start: Date,

        /// Last day of the range, inclusive.
        end: Date,
    },
}

/// Token naming a [`Period`] preset.
#[derive(Clone, Copy, Debug, Display, EnumString, Eq, PartialEq)]
#[strum(serialize_all = "camelCase")]
pub enum Token {
    /// [`Period::ThisWeek`].
    ThisWeek,

    /// [`Period::LastWeek`].
    LastWeek,

    /// [`Period::ThisMonth`].
    ThisMonth,

    /// [`Period::LastMonth`].
    LastMonth,

    /// [`Period::ThisYear`].
    ThisYear,

    /// [`Period::LastYear`].
    LastYear,

    /// [`Period::LastThirty`].
    LastThirty,

    /// [`Period::CustomRange`].
    CustomRange,
}

impl Default for Period {
    fn default() -> Self {
        Self::ThisMonth
    }
}

impl Period {
    /// Creates a new [`Period`] out of a raw `token` and raw `YYYY-MM-DD`
    /// dates.
    ///
    /// Explicit dates without a recognized `token` form a
    /// [`Period::CustomRange`]. Neither a recognized `token` nor dates
    /// resolve to the [`Period::ThisMonth`].
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDateFormat`] if a date cannot be parsed.
    /// - [`Error::MissingDates`] if a custom range lacks one of its dates.
    /// - [`Error::InvertedRange`] if `start` is after `end`.
    pub fn new(
        token: Option<&str>,
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, Error> {
        let token = token.and_then(|t| t.parse::<Token>().ok());
        match (token, start, end) {
            (Some(Token::CustomRange) | None, Some(start), Some(end)) => {
                Self::custom_range(start, end)
            }
            (Some(Token::CustomRange), _, _)
            | (None, Some(_), None)
            | (None, None, Some(_)) => Err(Error::MissingDates),
            (Some(token), _, _) => Ok(token.into()),
            (None, None, None) => Ok(Self::default()),
        }
    }

    /// Creates a new [`Period::CustomRange`] out of raw `YYYY-MM-DD` dates.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDateFormat`] if a date cannot be parsed.
    /// - [`Error::InvertedRange`] if `start` is after `end`.
    pub fn custom_range(start: &str, end: &str) -> Result<Self, Error> {
        let start = parse_date(start, DateField::StartDate)?;
        let end = parse_date(end, DateField::EndDate)?;
        if start > end {
            return Err(Error::InvertedRange);
        }
        Ok(Self::CustomRange { start, end })
    }

    /// Resolves this [`Period`] into a concrete [`Interval`] relative to the
    /// provided `now`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the [`Interval`] doesn't fit the supported
    /// calendar.
    pub fn resolve(&self, now: DateTime) -> Result<Interval, Error> {
        use Error as E;

        let today = now.date();
        let (start, end) = match *self {
            Self::ThisWeek => {
                let start = week_start(today)?;
                (start, shift_days(start, 7)?)
            }
            Self::LastWeek => {
                let end = week_start(today)?;
                (shift_days(end, -7)?, end)
            }
            Self::ThisMonth => {
                let start = month_start(today)?;
                (start, next_month(start)?)
            }
            Self::LastMonth => {
                let end = month_start(today)?;
                (previous_month(end)?, end)
            }
            Self::ThisYear => {
                (year_start(today.year())?, year_start(today.year() + 1)?)
            }
            Self::LastYear => {
                (year_start(today.year() - 1)?, year_start(today.year())?)
            }
            Self::LastThirty => {
                return Interval::new(now - THIRTY_DAYS, now)
                    .ok_or(E::OutOfRange);
            }
            Self::CustomRange { start, end } => (start, shift_days(end, 1)?),
        };
        Interval::new(DateTime::from_date(start), DateTime::from_date(end))
            .ok_or(E::OutOfRange)
    }

    /// Returns a human-readable label of this [`Period`].
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::ThisWeek => "This Week".into(),
            Self::LastWeek => "Last Week".into(),
            Self::ThisMonth => "This Month".into(),
            Self::LastMonth => "Last Month".into(),
            Self::ThisYear => "This Year".into(),
            Self::LastYear => "Last Year".into(),
            Self::LastThirty => "Last 30 Days".into(),
            Self::CustomRange { start, end } => format!(
                "{} to {}",
                DateTime::from_date(*start).to_date_string(),
                DateTime::from_date(*end).to_date_string(),
            ),
        }
    }
}

impl From<Token> for Period {
    /// [`Token::CustomRange`] without dates falls back to the
    /// [`Period::ThisMonth`].
    fn from(token: Token) -> Self {
        match token {
            Token::ThisWeek => Self::ThisWeek,
            Token::LastWeek => Self::LastWeek,
            Token::ThisMonth | Token::CustomRange => Self::ThisMonth,
            Token::LastMonth => Self::LastMonth,
            Token::ThisYear => Self::ThisYear,
            Token::LastYear => Self::LastYear,
            Token::LastThirty => Self::LastThirty,
        }
    }
}

/// Length of the [`Period::LastThirty`].
const THIRTY_DAYS: Duration = Duration::from_secs(30 * SECS_IN_DAY);

/// Number of seconds in a day.
const SECS_IN_DAY: u64 = 24 * 60 * 60;

/// Half-open `[start, end)` interval of time with `end > start`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Interval {
    /// Start of this [`Interval`], inclusive.
    start: DateTime,

    /// End of this [`Interval`], exclusive.
    end: DateTime,
}

impl Interval {
    /// Creates a new [`Interval`], if `end` is after `start`.
    #[must_use]
    pub fn new(start: DateTime, end: DateTime) -> Option<Self> {
        (end > start).then_some(Self { start, end })
    }

    /// Returns the calendar month containing the provided `date`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfRange`] if the month doesn't fit the supported calendar.
    pub fn month_of(date: Date) -> Result<Self, Error> {
        let start = month_start(date)?;
        Self::new(
            DateTime::from_date(start),
            DateTime::from_date(next_month(start)?),
        )
        .ok_or(Error::OutOfRange)
    }

    /// Returns the inclusive start of this [`Interval`].
    #[must_use]
    pub fn start(&self) -> DateTime {
        self.start
    }

    /// Returns the exclusive end of this [`Interval`].
    #[must_use]
    pub fn end(&self) -> DateTime {
        self.end
    }

    /// Indicates whether the provided [`DateTime`] falls into this
    /// [`Interval`].
    #[must_use]
    pub fn contains<Of: ?Sized>(&self, at: common::DateTimeOf<Of>) -> bool {
        let at = at.coerce();
        self.start <= at && at < self.end
    }

    /// Returns the length of this [`Interval`] in whole days.
    ///
    /// Partial days count as whole ones, so it's never less than `1`.
    #[must_use]
    pub fn days(&self) -> u32 {
        let nanos = (self.end - self.start).as_nanos();
        let days = nanos.div_ceil(u128::from(SECS_IN_DAY) * 1_000_000_000);
        u32::try_from(days).unwrap_or(u32::MAX).max(1)
    }
}

/// Secondary filter of the sales to report on.
///
/// Absent filters mean "everything the caller may see".
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Scope {
    /// ID of the [`team::Team`] to narrow the sales to.
    pub team_id: Option<team::Id>,

    /// ID of the [`User`] to narrow the sales to.
    pub user_id: Option<user::Id>,
}

impl Scope {
    /// Narrows this [`Scope`] to what the [`User`] with the provided `caller`
    /// ID and [`Role`] may see.
    ///
    /// Privileged [`User`]s see everything in their organization, while a
    /// salesperson sees own sales only.
    ///
    /// [`None`] is returned if the `caller` asks for somebody else's sales
    /// without a privilege to do so.
    #[must_use]
    pub fn narrowed_for(self, caller: user::Id, role: Role) -> Option<Self> {
        if role.is_privileged() {
            return Some(self);
        }
        if self.user_id.is_some_and(|id| id != caller) {
            return None;
        }
        Some(Self {
            team_id: None,
            user_id: Some(caller),
        })
    }
}

/// Date field of a [`Period::CustomRange`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum DateField {
    /// First day of the range.
    #[display("startDate")]
    StartDate,

    /// Last day of the range.
    #[display("endDate")]
    EndDate,
}

/// Error of creating or resolving a [`Period`].
#[derive(Clone, Copy, Debug, Display, Eq, PartialEq, StdError)]
pub enum Error {
    /// Date is not in the `YYYY-MM-DD` format.
    #[display("Invalid date format")]
    InvalidDateFormat(#[error(not(source))] DateField),

    /// Custom range lacks one of its dates.
    #[display("Both `startDate` and `endDate` are required")]
    MissingDates,

    /// Start of the range is after its end.
    #[display("`startDate` must not be after `endDate`")]
    InvertedRange,

    /// Period doesn't fit the supported calendar.
    #[display("Period is out of the supported calendar range")]
    OutOfRange,
}

/// Parses a `YYYY-MM-DD` date of the provided [`DateField`].
fn parse_date(input: &str, field: DateField) -> Result<Date, Error> {
    Date::parse(input.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| Error::InvalidDateFormat(field))
}

/// Returns the Monday of the week containing the provided `date`.
fn week_start(date: Date) -> Result<Date, Error> {
    shift_days(
        date,
        -i64::from(date.weekday().number_days_from_monday()),
    )
}

/// Shifts the provided `date` by the given number of `days`.
fn shift_days(date: Date, days: i64) -> Result<Date, Error> {
    date.checked_add(time::Duration::days(days))
        .ok_or(Error::OutOfRange)
}

/// Returns the first day of the month containing the provided `date`.
fn month_start(date: Date) -> Result<Date, Error> {
    date.replace_day(1).map_err(|_| Error::OutOfRange)
}

/// Returns the first day of the month following the one starting at the
/// provided `first` day.
fn next_month(first: Date) -> Result<Date, Error> {
    let (year, month) = match first.month() {
        Month::December => (first.year() + 1, Month::January),
        m => (first.year(), m.next()),
    };
    Date::from_calendar_date(year, month, 1).map_err(|_| Error::OutOfRange)
}

/// Returns the first day of the month preceding the one starting at the
/// provided `first` day.
fn previous_month(first: Date) -> Result<Date, Error> {
    let (year, month) = match first.month() {
        Month::January => (first.year() - 1, Month::December),
        m => (first.year(), m.previous()),
    };
    Date::from_calendar_date(year, month, 1).map_err(|_| Error::OutOfRange)
}

/// Returns the first day of the provided `year`.
fn year_start(year: i32) -> Result<Date, Error> {
    Date::from_calendar_date(year, Month::January, 1)
        .map_err(|_| Error::OutOfRange)
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use time::macros::date;

    use crate::domain::{team, user, user::Role};

    use super::{DateField, Error, Interval, Period, Scope};

    fn now() -> DateTime {
        // Wednesday.
        DateTime::from_rfc3339("2024-03-13T15:30:00Z").unwrap()
    }

    fn resolved(period: Period) -> (String, String) {
        let i = period.resolve(now()).unwrap();
        (i.start().to_rfc3339(), i.end().to_rfc3339())
    }

    #[test]
    fn resolves_weeks_from_monday() {
        assert_eq!(
            resolved(Period::ThisWeek),
            ("2024-03-11T00:00:00Z".into(), "2024-03-18T00:00:00Z".into()),
        );
        assert_eq!(
            resolved(Period::LastWeek),
            ("2024-03-04T00:00:00Z".into(), "2024-03-11T00:00:00Z".into()),
        );

        let monday = DateTime::from_rfc3339("2024-03-11T00:00:00Z").unwrap();
        let i = Period::ThisWeek.resolve(monday).unwrap();
        assert_eq!(i.start(), monday);
        assert_eq!(i.days(), 7);
    }

    #[test]
    fn resolves_calendar_months() {
        assert_eq!(
            resolved(Period::ThisMonth),
            ("2024-03-01T00:00:00Z".into(), "2024-04-01T00:00:00Z".into()),
        );
        assert_eq!(
            resolved(Period::LastMonth),
            ("2024-02-01T00:00:00Z".into(), "2024-03-01T00:00:00Z".into()),
        );
        assert_eq!(Period::LastMonth.resolve(now()).unwrap().days(), 29);

        let january = DateTime::from_rfc3339("2024-01-20T10:00:00Z").unwrap();
        let i = Period::LastMonth.resolve(january).unwrap();
        assert_eq!(i.start().to_rfc3339(), "2023-12-01T00:00:00Z");
        assert_eq!(i.end().to_rfc3339(), "2024-01-01T00:00:00Z");

        let december = DateTime::from_rfc3339("2023-12-31T23:59:59Z").unwrap();
        let i = Period::ThisMonth.resolve(december).unwrap();
        assert_eq!(i.end().to_rfc3339(), "2024-01-01T00:00:00Z");
    }

    #[test]
    fn resolves_calendar_years() {
        assert_eq!(
            resolved(Period::ThisYear),
            ("2024-01-01T00:00:00Z".into(), "2025-01-01T00:00:00Z".into()),
        );
        assert_eq!(
            resolved(Period::LastYear),
            ("2023-01-01T00:00:00Z".into(), "2024-01-01T00:00:00Z".into()),
        );
        assert_eq!(Period::ThisYear.resolve(now()).unwrap().days(), 366);
    }

    #[test]
    fn resolves_last_thirty_days() {
        let i = Period::LastThirty.resolve(now()).unwrap();

        assert_eq!(i.start().to_rfc3339(), "2024-02-12T15:30:00Z");
        assert_eq!(i.end(), now());
        assert_eq!(i.days(), 30);
    }

    #[test]
    fn custom_range_includes_whole_end_day() {
        let p = Period::new(
            Some("customRange"),
            Some("2024-01-01"),
            Some("2024-01-31"),
        )
        .unwrap();

        assert_eq!(
            resolved(p),
            ("2024-01-01T00:00:00Z".into(), "2024-02-01T00:00:00Z".into()),
        );
        assert_eq!(p.resolve(now()).unwrap().days(), 31);
        assert_eq!(p.label(), "2024-01-01 to 2024-01-31");

        let single = Period::custom_range("2024-01-05", "2024-01-05").unwrap();
        assert_eq!(single.resolve(now()).unwrap().days(), 1);
    }

    #[test]
    fn rejects_inverted_custom_range() {
        assert_eq!(
            Period::custom_range("2024-02-01", "2024-01-31"),
            Err(Error::InvertedRange),
        );
    }

    #[test]
    fn rejects_invalid_dates_without_panicking() {
        assert_eq!(
            Period::custom_range("2024-13-01", "2024-12-31"),
            Err(Error::InvalidDateFormat(DateField::StartDate)),
        );
        assert_eq!(
            Period::custom_range("2024-01-01", "31/01/2024"),
            Err(Error::InvalidDateFormat(DateField::EndDate)),
        );
        assert_eq!(
            Period::new(Some("customRange"), Some("2024-01-01"), None),
            Err(Error::MissingDates),
        );
        assert_eq!(
            Error::InvalidDateFormat(DateField::EndDate).to_string(),
            "Invalid date format",
        );
    }

    #[test]
    fn error_has_no_source() {
        let err: &dyn std::error::Error = &Error::InvalidDateFormat(
            DateField::StartDate,
        );

        assert!(err.source().is_none());
    }

    #[test]
    fn falls_back_to_current_month() {
        assert_eq!(Period::new(None, None, None), Ok(Period::ThisMonth));
        assert_eq!(
            Period::new(Some("fortnight"), None, None),
            Ok(Period::ThisMonth),
        );
        assert_eq!(
            Period::new(Some("lastThirty"), None, None),
            Ok(Period::LastThirty),
        );
        assert_eq!(
            Period::new(None, Some("2024-01-01"), Some("2024-01-02")),
            Ok(Period::CustomRange {
                start: date!(2024 - 01 - 01),
                end: date!(2024 - 01 - 02),
            }),
        );
    }

    #[test]
    fn every_preset_is_non_empty() {
        for p in [
            Period::ThisWeek,
            Period::LastWeek,
            Period::ThisMonth,
            Period::LastMonth,
            Period::ThisYear,
            Period::LastYear,
            Period::LastThirty,
        ] {
            let i = p.resolve(now()).unwrap();
            assert!(i.end() > i.start(), "{p:?}");
            assert!(i.days() >= 1, "{p:?}");
            assert!(!p.label().is_empty());
        }
    }

    #[test]
    fn counts_partial_days_as_whole() {
        let start = DateTime::from_rfc3339("2024-03-01T00:00:00Z").unwrap();
        let end = DateTime::from_rfc3339("2024-03-02T00:00:01Z").unwrap();
        assert_eq!(Interval::new(start, end).unwrap().days(), 2);

        let end = DateTime::from_rfc3339("2024-03-01T00:00:01Z").unwrap();
        assert_eq!(Interval::new(start, end).unwrap().days(), 1);
        assert!(Interval::new(end, start).is_none());
    }

    #[test]
    fn month_of_date() {
        let i = Interval::month_of(date!(2024 - 02 - 17)).unwrap();
        assert_eq!(i.start().to_rfc3339(), "2024-02-01T00:00:00Z");
        assert_eq!(i.end().to_rfc3339(), "2024-03-01T00:00:00Z");
        assert!(i.contains(DateTime::from_date(date!(2024 - 02 - 29))));
        assert!(!i.contains(i.end()));
    }

    #[test]
    fn salesperson_sees_own_sales_only() {
        let me = user::Id::new();
        let other = user::Id::new();

        let scope = Scope {
            team_id: Some(team::Id::new()),
            user_id: None,
        }
        .narrowed_for(me, Role::Salesperson)
        .unwrap();
        assert_eq!(scope, Scope { team_id: None, user_id: Some(me) });

        let foreign = Scope {
            team_id: None,
            user_id: Some(other),
        };
        assert!(foreign.narrowed_for(me, Role::Salesperson).is_none());
        assert_eq!(foreign.narrowed_for(me, Role::Supervisor), Some(foreign));
        assert_eq!(foreign.narrowed_for(me, Role::Admin), Some(foreign));
    }
}
