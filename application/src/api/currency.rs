//! Currency [`Rates`]-related definitions.

use common::{Currency, DateTime};
use derive_more::From;
use juniper::{graphql_object, GraphQLObject};
use service::domain::currency;

use crate::{
    api::{self, scalar},
    Context,
};

/// Latest known exchange rates relative to an anchor `Currency`.
#[derive(Clone, Debug, From)]
pub struct Rates(currency::Rates);

/// Latest known exchange rates relative to an anchor `Currency`.
#[graphql_object(name = "CurrencyRates", context = Context)]
impl Rates {
    /// `Currency` the rates are relative to.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CurrencyRates.anchor",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn anchor(&self) -> Currency {
        self.0.anchor()
    }

    /// `DateTime` when the rates were fetched from the provider.
    ///
    /// Absent while the configured fallback rates are served.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CurrencyRates.fetchedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn fetched_at(&self) -> Option<DateTime> {
        self.0.fetch_date().map(|at| at.coerce())
    }

    /// Units of each known `Currency` one unit of the anchor buys.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "CurrencyRates.conversionRates",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn conversion_rates(&self) -> Vec<ConversionRate> {
        self.0
            .iter()
            .map(|(currency, rate)| ConversionRate {
                currency,
                rate: rate.into(),
            })
            .collect()
    }
}

/// Exchange rate of a single `Currency`.
#[derive(Clone, Copy, Debug, GraphQLObject)]
pub struct ConversionRate {
    /// `Currency` of this rate.
    pub currency: Currency,

    /// Units of the `Currency` one unit of the anchor buys.
    pub rate: scalar::Decimal,
}
