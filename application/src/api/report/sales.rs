//! [`SalesSummary`] report definition.

use std::{collections::BTreeMap, sync::OnceLock};

use common::DateTime;
use derive_more::From;
use juniper::{graphql_object, GraphQLInputObject, GraphQLUnion};
use service::{
    domain::{
        classification::{source_type, work_type},
        period::{self, Scope},
        sales, team, user, Period,
    },
    query,
};

use crate::{
    api::{self, scalar},
    Context,
};

/// Filter of the sales to report on.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "SalesFilter")]
pub struct Filter {
    /// Named period (`thisWeek`, `lastMonth`, `lastThirty`, `customRange`).
    ///
    /// Unrecognized values fall back to the current month.
    pub period: Option<String>,

    /// First day of a custom range, in `YYYY-MM-DD` format.
    pub start_date: Option<String>,

    /// Last day of a custom range, in `YYYY-MM-DD` format.
    pub end_date: Option<String>,

    /// `Team` to narrow the sales to.
    pub team_id: Option<api::team::Id>,

    /// `User` to narrow the sales to.
    pub user_id: Option<api::user::Id>,
}

impl Filter {
    /// Splits this [`Filter`] into the requested [`Period`] and [`Scope`].
    ///
    /// # Errors
    ///
    /// If the [`Period`] cannot be constructed out of the provided raw
    /// values.
    pub fn into_parts(self) -> Result<(Period, Scope), period::Error> {
        let period = Period::new(
            self.period.as_deref(),
            self.start_date.as_deref(),
            self.end_date.as_deref(),
        )?;
        let scope = Scope {
            team_id: self.team_id.map(Into::into),
            user_id: self.user_id.map(Into::into),
        };
        Ok((period, scope))
    }
}

/// Outcome of a `SalesSummary` request.
#[derive(Clone, Debug, From, GraphQLUnion)]
#[graphql(name = "SalesSummaryResult", context = Context)]
pub enum Outcome {
    /// Successfully built report.
    Report(SalesSummary),

    /// Reason the report cannot be built.
    Failure(api::Failure),
}

/// Sales report over a period.
#[derive(Clone, Debug)]
pub struct SalesSummary {
    /// Underlying [`query::report::sales_summary::Output`].
    output: query::report::sales_summary::Output,

    /// [`WorkTypeRow`]s of this report.
    work_types: OnceLock<Vec<WorkTypeRow>>,

    /// [`SourceTypeRow`]s of this report.
    source_types: OnceLock<Vec<SourceTypeRow>>,

    /// [`UserRow`]s of this report.
    users: OnceLock<Vec<UserRow>>,

    /// [`TeamRow`]s of this report.
    teams: OnceLock<Vec<TeamRow>>,
}

impl From<query::report::sales_summary::Output> for SalesSummary {
    fn from(output: query::report::sales_summary::Output) -> Self {
        Self {
            output,
            work_types: OnceLock::new(),
            source_types: OnceLock::new(),
            users: OnceLock::new(),
            teams: OnceLock::new(),
        }
    }
}

/// Sales report over a period.
#[graphql_object(name = "SalesSummary", context = Context)]
impl SalesSummary {
    /// Human-readable label of the reported period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.periodLabel",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn period_label(&self) -> &str {
        &self.output.label
    }

    /// Start of the reported period, inclusive.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.start",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn start(&self) -> DateTime {
        self.output.interval.start()
    }

    /// End of the reported period, exclusive.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.end",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn end(&self) -> DateTime {
        self.output.interval.end()
    }

    /// Overall `SalesFigures` of the period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.summary",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn summary(&self) -> Figures {
        self.output.report.summary.into()
    }

    /// Per-day `SalesMetrics` of the period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.metrics",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn metrics(&self) -> Metrics {
        self.output.report.metrics.into()
    }

    /// `SalesFigures` per `WorkType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.workTypeSales",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn work_type_sales(&self) -> &[WorkTypeRow] {
        self.work_types
            .get_or_init(|| rows(&self.output.report.by_work_type))
            .as_slice()
    }

    /// `SalesFigures` per `SourceType`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.sourceTypeSales",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn source_type_sales(&self) -> &[SourceTypeRow] {
        self.source_types
            .get_or_init(|| rows(&self.output.report.by_source_type))
            .as_slice()
    }

    /// `SalesFigures` per `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.userSales",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn user_sales(&self) -> &[UserRow] {
        self.users
            .get_or_init(|| rows(&self.output.report.by_user))
            .as_slice()
    }

    /// `SalesFigures` per `Team`.
    ///
    /// Sales of `User`s outside any `Team` are not listed here.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesSummary.teamSales",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn team_sales(&self) -> &[TeamRow] {
        self.teams
            .get_or_init(|| rows(&self.output.report.by_team))
            .as_slice()
    }
}

/// Converts the provided breakdown into its rows.
fn rows<K, R>(breakdown: &BTreeMap<K, sales::Summary>) -> Vec<R>
where
    K: Copy,
    R: From<(K, sales::Summary)>,
{
    breakdown.iter().map(|(k, s)| R::from((*k, *s))).collect()
}

/// Aggregated sales figures.
#[derive(Clone, Copy, Debug, From)]
pub struct Figures(sales::Summary);

/// Aggregated sales figures.
#[graphql_object(name = "SalesFigures", context = Context)]
impl Figures {
    /// Sum of the reported `Deal` values.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.totalSalesDealValue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_sales_deal_value(&self) -> scalar::Decimal {
        self.0.total_sales_deal_value.into()
    }

    /// Sum of the verified `Payment`s of the reported `Deal`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.totalPaid",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_paid(&self) -> scalar::Decimal {
        self.0.total_paid.into()
    }

    /// Value not paid yet, never negative.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.totalDue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_due(&self) -> scalar::Decimal {
        self.0.total_due.into()
    }

    /// Number of the reported `Deal`s.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.totalDeals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn total_deals(&self) -> i32 {
        count(self.0.total_deals)
    }

    /// Number of the reported `Deal`s waiting for their money.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.pendingDeals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn pending_deals(&self) -> i32 {
        count(self.0.pending_deals)
    }

    /// Number of the reported `Deal`s paid in full.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.fullyPaidDeals",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn fully_paid_deals(&self) -> i32 {
        count(self.0.fully_paid_deals)
    }

    /// Percentage of the deal value being paid, may exceed `100`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.collectionPercentage",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn collection_percentage(&self) -> scalar::Decimal {
        self.0.collection_percentage.into()
    }

    /// Sum of the verified `Payment`s received within the period.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesFigures.selectedDatePaidAmount",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn selected_date_paid_amount(&self) -> scalar::Decimal {
        self.0.selected_date_paid_amount.into()
    }
}

/// Converts the provided count into a GraphQL `Int`, saturating on overflow.
fn count(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

/// Per-day averages of a period.
#[derive(Clone, Copy, Debug, From)]
pub struct Metrics(sales::Metrics);

/// Per-day averages of a period.
#[graphql_object(name = "SalesMetrics", context = Context)]
impl Metrics {
    /// Average deal value per day.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesMetrics.dailyAverageDealValue",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn daily_average_deal_value(&self) -> scalar::Decimal {
        self.0.daily_average_deal_value.into()
    }

    /// Average collected amount per day.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "SalesMetrics.dailyAverageCollection",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    #[must_use]
    pub fn daily_average_collection(&self) -> scalar::Decimal {
        self.0.daily_average_collection.into()
    }
}

/// Defines a breakdown row of a [`SalesSummary`].
macro_rules! define_row {
    (
        $(#[doc = $doc:literal])*
        $row:ident($name:literal) {
            $field:ident: $object:ty = $id:ty $(,)?
        }
    ) => {
        $(#[doc = $doc])*
        #[derive(Clone, Debug)]
        pub struct $row {
            /// Entity this row is about.
            $field: $object,

            /// [`Figures`] of this row.
            figures: Figures,
        }

        impl From<($id, sales::Summary)> for $row {
            fn from((id, summary): ($id, sales::Summary)) -> Self {
                #[expect(
                    unsafe_code,
                    reason = "reported IDs come from the repository"
                )]
                let $field = unsafe { <$object>::new_unchecked(id) };
                Self {
                    $field,
                    figures: summary.into(),
                }
            }
        }

        $(#[doc = $doc])*
        #[graphql_object(name = $name, context = Context)]
        impl $row {
            /// Entity this row is about.
            #[must_use]
            pub fn $field(&self) -> &$object {
                &self.$field
            }

            /// `SalesFigures` of this row.
            #[must_use]
            pub fn figures(&self) -> Figures {
                self.figures
            }
        }
    };
}

define_row! {
    /// Sales of a single `WorkType`.
    WorkTypeRow("WorkTypeSales") {
        work_type: api::WorkType = work_type::Id
    }
}

define_row! {
    /// Sales of a single `SourceType`.
    SourceTypeRow("SourceTypeSales") {
        source_type: api::SourceType = source_type::Id
    }
}

define_row! {
    /// Sales of a single `User`.
    UserRow("UserSales") {
        user: api::User = user::Id
    }
}

define_row! {
    /// Sales of a single `Team`.
    TeamRow("TeamSales") {
        team: api::Team = team::Id
    }
}

#[cfg(test)]
mod spec {
    use super::Filter;

    #[test]
    fn empty_filter_reports_this_month() {
        let (period, scope) = Filter::default().into_parts().unwrap();

        assert_eq!(period.label(), "This Month");
        assert_eq!(scope.team_id, None);
        assert_eq!(scope.user_id, None);
    }

    #[test]
    fn custom_range_requires_both_dates() {
        let filter = Filter {
            period: Some("customRange".into()),
            start_date: Some("2024-01-01".into()),
            ..Filter::default()
        };

        assert!(filter.into_parts().is_err());
    }
}
