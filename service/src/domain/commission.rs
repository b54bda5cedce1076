//! [`Commission`] definitions.

use std::{fmt, str::FromStr};

use common::{money, unit, Currency, DateTimeOf, Percent};
use derive_more::{Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::domain::{
    currency::Rates,
    organization,
    period::{self, Interval},
    user,
};
#[cfg(doc)]
use crate::domain::{Organization, User};

/// Monthly commission of a salesperson.
///
/// Starts as a [`State::Draft`] and is persisted only once being
/// [`Commission::save`]d. Saved [`Commission`]s are never changed.
#[derive(Clone, Debug)]
pub struct Commission {
    /// ID of this [`Commission`].
    pub id: Id,

    /// ID of the [`Organization`] this [`Commission`] belongs to.
    pub organization_id: organization::Id,

    /// ID of the [`User`] this [`Commission`] is paid to.
    pub user_id: user::Id,

    /// [`user::Name`] of the [`User`] at the moment of computing.
    pub user_name: user::Name,

    /// [`Month`] this [`Commission`] is paid for.
    pub month: Month,

    /// [`Currency`] the sales are denominated in.
    pub base_currency: Currency,

    /// [`Terms`] this [`Commission`] is computed on.
    pub terms: Terms,

    /// Exchange rate from the [`Commission::base_currency`] into the
    /// [`Terms::currency`] being applied.
    pub exchange_rate: Decimal,

    /// Computed [`Figures`].
    pub figures: Figures,

    /// [`State`] of this [`Commission`].
    pub state: State,
}

impl Commission {
    /// Computes a new [`State::Draft`] [`Commission`] out of the provided
    /// `total_sales` in the `base` [`Currency`].
    ///
    /// The [`Terms::rate`] override takes precedence over the provided
    /// [`Rates`].
    ///
    /// # Errors
    ///
    /// [`Overflow`] if any of the [`Figures`] exceeds [`money::MAX`].
    pub fn draft(
        organization_id: organization::Id,
        user_name: user::Name,
        month: Month,
        base: Currency,
        total_sales: Decimal,
        terms: Terms,
        rates: &Rates,
    ) -> Result<Self, Overflow> {
        let overflow = || Overflow(terms.user_id);

        let (exchange_rate, converted) = match terms.rate {
            Some(rate) => (
                rate.value(),
                total_sales.checked_mul(rate.value()).map(money::round),
            ),
            None => (
                rates
                    .derive_rate(base, terms.currency)
                    .ok_or_else(overflow)?,
                rates.convert(total_sales, base, terms.currency),
            ),
        };
        let figures = converted
            .and_then(|converted| {
                Figures::compute(
                    total_sales,
                    converted,
                    terms.percent,
                    terms.bonus,
                )
            })
            .ok_or_else(overflow)?;

        Ok(Self {
            id: Id::new(),
            organization_id,
            user_id: terms.user_id,
            user_name,
            month,
            base_currency: base,
            exchange_rate,
            figures,
            terms,
            state: State::Draft,
        })
    }

    /// Saves this [`Commission`] at the provided [`SaveDateTime`].
    ///
    /// # Errors
    ///
    /// [`AlreadySaved`] if this [`Commission`] is saved already.
    pub fn save(&mut self, at: SaveDateTime) -> Result<(), AlreadySaved> {
        match self.state {
            State::Draft => {
                self.state = State::Saved { saved_at: at };
                Ok(())
            }
            State::Saved { .. } => Err(AlreadySaved(self.id)),
        }
    }
}

/// Lifecycle state of a [`Commission`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    /// Computed, but not persisted yet.
    Draft,

    /// Persisted and final.
    Saved {
        /// [`SaveDateTime`] when the [`Commission`] was saved.
        saved_at: SaveDateTime,
    },
}

/// Error of saving an already saved [`Commission`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Commission(id: {_0})` is saved already")]
pub struct AlreadySaved(#[error(not(source))] pub Id);

/// Error of computing [`Figures`] not fitting into [`money::MAX`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Commission` figures of `User(id: {_0})` are out of range")]
pub struct Overflow(#[error(not(source))] pub user::Id);

/// Terms a [`Commission`] of a single salesperson is computed on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Terms {
    /// ID of the salesperson [`User`].
    pub user_id: user::Id,

    /// [`Currency`] the [`Commission`] is paid in.
    pub currency: Currency,

    /// Share of the converted sales being paid.
    pub percent: Percent,

    /// [`Bonus`] on top, in the [`Terms::currency`].
    pub bonus: Bonus,

    /// Manual exchange [`Rate`] overriding the current [`Rates`], if any.
    pub rate: Option<Rate>,
}

/// Figures of a [`Commission`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Figures {
    /// Total value of the sales in the base [`Currency`].
    pub total_sales: Decimal,

    /// [`Figures::total_sales`] converted into the target [`Currency`].
    pub converted_amount: Decimal,

    /// [`Percent`] share of the [`Figures::converted_amount`].
    pub commission_amount: Decimal,

    /// [`Figures::commission_amount`] with the [`Bonus`].
    pub total_commission: Decimal,

    /// [`Figures::converted_amount`] with the [`Figures::total_commission`].
    pub total_received: Decimal,
}

impl Figures {
    /// Computes [`Figures`] out of the already converted sales.
    ///
    /// [`None`] if any of the [`Figures`] exceeds [`money::MAX`].
    #[must_use]
    pub fn compute(
        total_sales: Decimal,
        converted: Decimal,
        percent: Percent,
        bonus: Bonus,
    ) -> Option<Self> {
        let commission = percent.of(converted)?;
        let total_commission =
            money::round(commission.checked_add(bonus.amount())?);
        let figures = Self {
            total_sales,
            converted_amount: converted,
            commission_amount: money::round(commission),
            total_commission,
            total_received: money::round(
                converted.checked_add(total_commission)?,
            ),
        };
        [
            figures.total_sales,
            figures.converted_amount,
            figures.total_received,
        ]
        .iter()
        .all(|f| *f <= money::MAX)
        .then_some(figures)
    }
}

/// ID of a [`Commission`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    derive_more::FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Non-negative bonus of a [`Commission`].
#[derive(Clone, Copy, Debug, Default, Display, Eq, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Bonus(Decimal);

impl Bonus {
    /// Creates a new [`Bonus`] if the given `amount` is not negative and
    /// doesn't exceed [`money::MAX`].
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        let amount = money::round(amount);
        (Decimal::ZERO..=money::MAX)
            .contains(&amount)
            .then_some(Self(amount))
    }

    /// Returns the amount of this [`Bonus`].
    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for Bonus {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Bonus`")
    }
}

/// Positive manual exchange rate of a [`Commission`].
#[derive(Clone, Copy, Debug, Display, Eq, Into, PartialEq)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a new [`Rate`] if the given `value` is positive.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        (value > Decimal::ZERO).then_some(Self(value))
    }

    /// Returns the value of this [`Rate`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

/// Calendar month a [`Commission`] is paid for.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Month(Date);

impl Month {
    /// Returns the [`Month`] containing the provided [`Date`].
    #[must_use]
    pub fn of(date: Date) -> Self {
        Self(date.replace_day(1).unwrap_or(date))
    }

    /// Returns the first [`Date`] of this [`Month`].
    #[must_use]
    pub fn first_day(self) -> Date {
        self.0
    }

    /// Returns the [`Interval`] covering this [`Month`].
    ///
    /// # Errors
    ///
    /// [`period::Error::OutOfRange`] if this [`Month`] is the last one of the
    /// supported calendar.
    pub fn interval(self) -> Result<Interval, period::Error> {
        Interval::month_of(self.0)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.0.year(), u8::from(self.0.month()))
    }
}

impl FromStr for Month {
    type Err = &'static str;

    /// Parses a [`Month`] from its `YYYY-MM` representation.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ERR: &str = "invalid `Month`, expected `YYYY-MM`";

        let (year, month) = s.trim().split_once('-').ok_or(ERR)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(ERR);
        }
        let year = year.parse::<i32>().map_err(|_| ERR)?;
        let month = month
            .parse::<u8>()
            .ok()
            .and_then(|m| time::Month::try_from(m).ok())
            .ok_or(ERR)?;
        Date::from_calendar_date(year, month, 1)
            .map(Self)
            .map_err(|_| ERR)
    }
}

/// Save marker.
#[derive(Clone, Copy, Debug)]
pub struct Save;

/// [`DateTime`] when a [`Commission`] was saved.
///
/// [`DateTime`]: common::DateTime
pub type SaveDateTime = DateTimeOf<(Commission, Save)>;

/// [`DateTime`] when a [`Commission`] was created.
///
/// [`DateTime`]: common::DateTime
pub type CreationDateTime = DateTimeOf<(Commission, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money, Currency, DateTime, Percent};
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::domain::{currency::Rates, organization, user};

    use super::{
        Bonus, Commission, Figures, Month, Overflow, Rate, State, Terms,
    };

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn currency(code: &str) -> Currency {
        Currency::new(code).unwrap()
    }

    fn rates() -> Rates {
        Rates::new(
            currency("NPR"),
            [
                (currency("USD"), decimal("0.0075")),
                (currency("INR"), decimal("0.625")),
            ],
        )
    }

    fn terms(target: &str, percent: &str, bonus: &str) -> Terms {
        Terms {
            user_id: user::Id::new(),
            currency: currency(target),
            percent: percent.parse::<Percent>().unwrap(),
            bonus: bonus.parse::<Bonus>().unwrap(),
            rate: None,
        }
    }

    fn draft(total_sales: &str, terms: Terms) -> Commission {
        try_draft(decimal(total_sales), terms).unwrap()
    }

    fn try_draft(
        total_sales: Decimal,
        terms: Terms,
    ) -> Result<Commission, Overflow> {
        Commission::draft(
            organization::Id::new(),
            user::Name::new("Sita Sharma").unwrap(),
            "2024-01".parse().unwrap(),
            currency("NPR"),
            total_sales,
            terms,
            &rates(),
        )
    }

    #[test]
    fn computes_converted_commission() {
        let c = draft("1000", terms("USD", "10", "5"));

        assert_eq!(c.exchange_rate, decimal("0.0075"));
        assert_eq!(c.figures.converted_amount, decimal("7.5"));
        assert_eq!(c.figures.commission_amount, decimal("0.75"));
        assert_eq!(c.figures.total_commission, decimal("5.75"));
        assert_eq!(c.figures.total_received, decimal("13.25"));
        assert_eq!(c.state, State::Draft);
    }

    #[test]
    fn prefers_manual_rate() {
        let mut t = terms("USD", "10", "0");
        t.rate = Some(Rate::new(decimal("0.008")).unwrap());

        let c = draft("1000", t);

        assert_eq!(c.exchange_rate, decimal("0.008"));
        assert_eq!(c.figures.converted_amount, decimal("8"));
        assert_eq!(c.figures.total_commission, decimal("0.8"));
        assert_eq!(c.figures.total_received, decimal("8.8"));
    }

    #[test]
    fn same_currency_is_not_converted() {
        let c = draft("1234.56", terms("NPR", "12.5", "100"));

        assert_eq!(c.exchange_rate, Decimal::ONE);
        assert_eq!(c.figures.converted_amount, decimal("1234.56"));
        assert_eq!(c.figures.commission_amount, decimal("154.32"));
        assert_eq!(c.figures.total_commission, decimal("254.32"));
        assert_eq!(c.figures.total_received, decimal("1488.88"));
    }

    #[test]
    fn rounds_once_on_totals() {
        let f = Figures::compute(
            decimal("0.05"),
            decimal("0.05"),
            Percent::new(decimal("10")).unwrap(),
            Bonus::new(decimal("0.004")).unwrap(),
        )
        .unwrap();

        assert_eq!(f.commission_amount, decimal("0.01"));
        assert_eq!(f.total_commission, decimal("0.01"));
        assert_eq!(f.total_received, decimal("0.06"));
    }

    #[test]
    fn unknown_currency_converts_at_anchor_rate() {
        let c = draft("1000", terms("XYZ", "10", "0"));

        assert_eq!(c.figures.converted_amount, decimal("1000"));
        assert_eq!(c.figures.total_commission, decimal("100"));
    }

    #[test]
    fn saves_only_once() {
        let mut c = draft("1000", terms("USD", "10", "5"));
        let at = DateTime::now().coerce();

        c.save(at).unwrap();
        assert_eq!(c.state, State::Saved { saved_at: at });

        assert!(c.save(DateTime::now().coerce()).is_err());
        assert_eq!(c.state, State::Saved { saved_at: at });
    }

    #[test]
    fn validates_terms() {
        assert!(Bonus::new(decimal("-1")).is_none());
        assert_eq!(Bonus::new(decimal("0")), Some(Bonus::default()));
        assert!(Bonus::new(money::MAX + Decimal::ONE).is_none());
        assert!(Rate::new(Decimal::ZERO).is_none());
        assert!("101".parse::<Percent>().is_err());
    }

    #[test]
    fn huge_figures_are_rejected() {
        let mut t = terms("USD", "10", "0");
        t.rate = Some(Rate::new(decimal("100000000000000")).unwrap());

        assert!(try_draft(decimal("1000000000000000"), t).is_err());

        let mut t = terms("NPR", "100", "0");
        t.bonus = Bonus::new(money::MAX).unwrap();

        assert!(try_draft(decimal("1"), t).is_err());
    }

    #[test]
    fn parses_month() {
        let m = "2024-02".parse::<Month>().unwrap();

        assert_eq!(m.first_day(), date!(2024 - 02 - 01));
        assert_eq!(m.to_string(), "2024-02");
        assert_eq!(Month::of(date!(2024 - 02 - 29)), m);
        assert_eq!(m.interval().unwrap().days(), 29);

        assert!("2024-13".parse::<Month>().is_err());
        assert!("2024-1".parse::<Month>().is_err());
        assert!("24-01".parse::<Month>().is_err());
        assert!("2024/01".parse::<Month>().is_err());
    }
}
