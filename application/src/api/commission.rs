//! [`Commission`]-related definitions.

use common::{Currency, DateTime, Percent};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLInputObject, GraphQLScalar, GraphQLUnion,
};
use service::{
    domain::{self, commission},
    query,
};
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    Context,
};

/// A commission of a salesperson for a month, either computed or saved.
#[derive(Clone, Debug, From)]
pub struct Commission(domain::Commission);

/// A commission of a salesperson for a month, either computed or saved.
#[graphql_object(name = "CommissionRecord", context = Context)]
impl Commission {
    /// Unique identifier of this `CommissionRecord`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// `User` this `CommissionRecord` is paid to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.user",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn user(&self) -> api::User {
        #[expect(
            unsafe_code,
            reason = "`Commission` is computed for existing `User`s only"
        )]
        let user = unsafe { api::User::new_unchecked(self.0.user_id) };
        user
    }

    /// Name of the `User` at the moment of computation.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.userName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn user_name(&self) -> api::user::Name {
        self.0.user_name.clone().into()
    }

    /// Month this `CommissionRecord` is paid for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.month",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn month(&self) -> Month {
        self.0.month.into()
    }

    /// `Currency` the sales are denominated in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.baseCurrency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn base_currency(&self) -> Currency {
        self.0.base_currency
    }

    /// `Currency` this `CommissionRecord` is paid in.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.currency",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.0.terms.currency
    }

    /// Commission percentage applied to the converted sales.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.percent",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn percent(&self) -> Percent {
        self.0.terms.percent
    }

    /// Bonus added on top of the commission amount.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.bonus",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn bonus(&self) -> Bonus {
        self.0.terms.bonus.into()
    }

    /// Exchange rate from the base `Currency` used for the conversion.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.exchangeRate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn exchange_rate(&self) -> scalar::Decimal {
        self.0.exchange_rate.into()
    }

    /// Indicator whether the exchange rate was provided manually.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.isManualRate",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn is_manual_rate(&self) -> bool {
        self.0.terms.rate.is_some()
    }

    /// Sales of the `User` within the month, in the base `Currency`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.totalSales",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_sales(&self) -> scalar::Decimal {
        self.0.figures.total_sales.into()
    }

    /// Sales converted into the payout `Currency`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.convertedAmount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn converted_amount(&self) -> scalar::Decimal {
        self.0.figures.converted_amount.into()
    }

    /// Percentage of the converted sales.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.commissionAmount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn commission_amount(&self) -> scalar::Decimal {
        self.0.figures.commission_amount.into()
    }

    /// Commission amount with the bonus.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.totalCommission",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_commission(&self) -> scalar::Decimal {
        self.0.figures.total_commission.into()
    }

    /// Everything the `User` receives for the month.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.totalReceived",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_received(&self) -> scalar::Decimal {
        self.0.figures.total_received.into()
    }

    /// `DateTime` when this `CommissionRecord` was saved, if it was.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionRecord.savedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn saved_at(&self) -> Option<DateTime> {
        match self.0.state {
            commission::State::Draft => None,
            commission::State::Saved { saved_at } => Some(saved_at.coerce()),
        }
    }
}

/// Computed, but not saved, commissions of a month.
#[derive(Clone, Debug)]
pub struct Draft {
    /// `Organization` the commissions are computed within.
    organization: api::Organization,

    /// Computed commissions.
    commissions: Vec<Commission>,
}

impl From<query::commission_draft::Output> for Draft {
    fn from(output: query::commission_draft::Output) -> Self {
        Self {
            organization: output.organization.into(),
            commissions: output
                .commissions
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }
}

/// Computed, but not saved, commissions of a month.
#[graphql_object(name = "CommissionDraft", context = Context)]
impl Draft {
    /// `Organization` the commissions are computed within.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionDraft.organization",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn organization(&self) -> &api::Organization {
        &self.organization
    }

    /// Computed `CommissionRecord`s, in the order of the provided entries.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CommissionDraft.commissions",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn commissions(&self) -> &[Commission] {
        &self.commissions
    }
}

/// Outcome of a `CommissionDraft` request.
#[derive(Clone, Debug, From, GraphQLUnion)]
#[graphql(name = "CommissionDraftResult", context = Context)]
pub enum DraftOutcome {
    /// Successfully computed commissions.
    Draft(Draft),

    /// Reason the commissions cannot be computed.
    Failure(api::Failure),
}

/// Commissions to compute or save for a month.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "CommissionSheet")]
pub struct Sheet {
    /// Month to compute the commissions for.
    pub month: Month,

    /// `Currency` the sales are denominated in.
    ///
    /// Must be the working `Currency` of the `Organization`.
    pub base_currency: Currency,

    /// Terms of every salesperson to pay a commission to.
    pub entries: Vec<Entry>,
}

impl Sheet {
    /// Validates this [`Sheet`] and splits it into its month, base
    /// [`Currency`] and [`commission::Terms`].
    ///
    /// # Errors
    ///
    /// `VALIDATION_ERROR` [`api::Failure`] pointing at every invalid entry
    /// field (`entries[1].percent`, for example).
    pub fn into_parts(
        self,
    ) -> Result<
        (commission::Month, Currency, Vec<commission::Terms>),
        api::Failure,
    > {
        let Self {
            month,
            base_currency,
            entries,
        } = self;

        let mut validation = api::Validation::default();
        let terms = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| entry.into_terms(i, &mut validation))
            .collect::<Vec<_>>();
        let terms = validation.finish(terms.into_iter().collect())?;

        Ok((month.into(), base_currency, terms))
    }
}

/// Commission terms of a single salesperson.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "CommissionEntry")]
pub struct Entry {
    /// `User` to pay the commission to.
    pub user_id: api::user::Id,

    /// `Currency` to pay the commission in.
    pub currency: Currency,

    /// Commission percentage, from `0` to `100`.
    pub percent: scalar::Decimal,

    /// Non-negative bonus on top of the commission, zero if omitted.
    pub bonus: Option<scalar::Decimal>,

    /// Positive manual exchange rate overriding the latest known one.
    pub rate: Option<scalar::Decimal>,
}

impl Entry {
    /// Validates this [`Entry`] standing at the provided `index` of a
    /// [`Sheet`].
    fn into_terms(
        self,
        index: usize,
        validation: &mut api::Validation,
    ) -> Option<commission::Terms> {
        let field = |name| format!("entries[{index}].{name}");

        let percent = validation.check(
            field("percent"),
            Percent::new(self.percent.into()),
            "must be from 0 to 100",
        );
        let bonus = match self.bonus {
            None => Some(commission::Bonus::default()),
            Some(b) => validation.check(
                field("bonus"),
                commission::Bonus::new(b.into()),
                "must be non-negative and fit into 18 integer digits",
            ),
        };
        let rate = match self.rate {
            None => Some(None),
            Some(r) => validation
                .check(
                    field("rate"),
                    commission::Rate::new(r.into()),
                    "must be positive",
                )
                .map(Some),
        };

        Some(commission::Terms {
            user_id: self.user_id.into(),
            currency: self.currency,
            percent: percent?,
            bonus: bonus?,
            rate: rate?,
        })
    }
}

/// Unique identifier of a `CommissionRecord`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(commission::Id)]
#[into(commission::Id)]
#[graphql(name = "CommissionId", transparent)]
pub struct Id(Uuid);

/// Calendar month in `YYYY-MM` format.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CommissionMonth",
    with = scalar::Via::<commission::Month>,
)]
pub struct Month(commission::Month);

/// Non-negative bonus of a commission, as a decimal string (`"100.00"`).
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "CommissionBonus",
    with = scalar::Via::<commission::Bonus>,
)]
pub struct Bonus(commission::Bonus);

#[cfg(test)]
mod spec {
    use common::Currency;
    use juniper::{graphql_input_value, FromInputValue as _, InputValue};
    use rust_decimal::Decimal;
    use service::domain::{commission, user};

    use super::{Entry, Sheet};

    fn entry(percent: &str) -> Entry {
        Entry {
            user_id: user::Id::new().into(),
            currency: Currency::USD,
            percent: percent.parse::<Decimal>().unwrap().into(),
            bonus: None,
            rate: None,
        }
    }

    fn sheet(entries: Vec<Entry>) -> Sheet {
        Sheet {
            month: "2024-03".parse::<commission::Month>().unwrap().into(),
            base_currency: Currency::USD,
            entries,
        }
    }

    #[test]
    fn omitted_bonus_is_zero() {
        let (month, base, terms) =
            sheet(vec![entry("10")]).into_parts().unwrap();

        assert_eq!(month.to_string(), "2024-03");
        assert_eq!(base, Currency::USD);
        assert_eq!(terms[0].bonus.amount(), Decimal::ZERO);
        assert_eq!(terms[0].rate, None);
    }

    #[test]
    fn out_of_range_percent_is_accepted_as_input() {
        let input: InputValue = graphql_input_value!({
            "userId": "f3a1c3e2-5b7d-4c1e-9a0b-2d7e8f6a4b1c",
            "currency": "USD",
            "percent": "150",
        });

        let entry = Entry::from_input_value(&input).unwrap();

        assert_eq!(Decimal::from(entry.percent), Decimal::from(150));
    }

    #[test]
    fn reports_every_invalid_entry_field() {
        let mut second = entry("150");
        second.bonus = Some(Decimal::NEGATIVE_ONE.into());
        second.rate = Some(Decimal::ZERO.into());

        let failure =
            sheet(vec![entry("10"), second]).into_parts().unwrap_err();

        assert_eq!(failure.code, "VALIDATION_ERROR");
        let fields = failure
            .field_errors
            .into_iter()
            .map(|e| e.field)
            .collect::<Vec<_>>();
        assert_eq!(
            fields,
            [
                "entries[1].percent",
                "entries[1].bonus",
                "entries[1].rate",
            ],
        );
    }
}
