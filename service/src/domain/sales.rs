//! Aggregation of [`Deal`]s and their [`Payment`]s into sales [`Report`]s.
//!
//! Aggregation is a pure function of its inputs: whatever the repository
//! returned for the resolved [`Interval`] goes in, a fresh [`Report`] comes
//! out.

use std::collections::BTreeMap;

use common::money;
use rust_decimal::Decimal;

use crate::domain::{
    classification::{source_type, work_type},
    deal, organization, payment,
    period::{Interval, Scope},
    team, user,
};
#[cfg(doc)]
use crate::domain::{Deal, Payment, Team, User};

/// Criteria of selecting the inputs of an [`aggregate()`] from a repository.
#[derive(Clone, Copy, Debug)]
pub struct Selector {
    /// ID of the organization the sales belong to.
    pub organization_id: organization::Id,

    /// [`Interval`] the sales are reported for.
    pub interval: Interval,

    /// [`Scope`] narrowing the sales.
    pub scope: Scope,
}

/// Reporting keys of a [`Deal`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Attribution {
    /// ID of the [`User`] the [`Deal`] is assigned to.
    pub user_id: user::Id,

    /// ID of the [`Team`] the [`User`] reports within, if any.
    pub team_id: Option<team::Id>,

    /// ID of the [`Deal`]'s work type.
    pub work_type_id: work_type::Id,

    /// ID of the [`Deal`]'s source type.
    pub source_type_id: source_type::Id,
}

/// [`Deal`] made within a reported [`Interval`], along with its [`Payment`]s.
#[derive(Clone, Debug)]
pub struct Sale {
    /// ID of the [`Deal`].
    pub deal_id: deal::Id,

    /// [`deal::Value`] of the [`Deal`].
    pub value: deal::Value,

    /// [`deal::DealDateTime`] of the [`Deal`].
    pub deal_date: deal::DealDateTime,

    /// Reporting keys of the [`Deal`].
    pub attribution: Attribution,

    /// All the [`Payment`]s of the [`Deal`], regardless of their dates.
    pub installments: Vec<Installment>,
}

/// Figures of a [`Payment`] relevant to a [`Sale`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Installment {
    /// [`payment::Amount`] of the [`Payment`].
    pub amount: payment::Amount,

    /// Review status of the [`Payment`].
    pub status: payment::StatusKind,
}

impl Sale {
    /// Returns the sum of the verified [`Installment`]s of this [`Sale`].
    #[must_use]
    pub fn paid(&self) -> Decimal {
        self.installments
            .iter()
            .filter(|i| i.status == payment::StatusKind::Verified)
            .map(|i| i.amount.value())
            .sum()
    }

    /// Indicates whether this [`Sale`] still waits for its money: nothing is
    /// verified yet, and there is either a pending [`Installment`] or none at
    /// all.
    ///
    /// A zero-valued [`Sale`] has nothing to wait for.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        use payment::StatusKind as S;

        if self.value.amount().is_zero() {
            return false;
        }
        let has = |s| self.installments.iter().any(|i| i.status == s);
        !has(S::Verified) && (self.installments.is_empty() || has(S::Pending))
    }

    /// Indicates whether the verified [`Installment`]s cover the whole
    /// [`deal::Value`] of this [`Sale`].
    #[must_use]
    pub fn is_fully_paid(&self) -> bool {
        self.paid() >= self.value.amount()
    }
}

/// Verified [`Payment`] received within a reported [`Interval`], regardless
/// of when its [`Deal`] was made.
#[derive(Clone, Copy, Debug)]
pub struct Collection {
    /// Received [`payment::Amount`].
    pub amount: payment::Amount,

    /// [`payment::PaymentDateTime`] of the [`Payment`].
    pub payment_date: payment::PaymentDateTime,

    /// Reporting keys of the [`Payment`]'s [`Deal`].
    pub attribution: Attribution,
}

/// Aggregated sales figures.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Summary {
    /// Sum of the values of the reported [`Deal`]s.
    pub total_sales_deal_value: Decimal,

    /// Sum of the verified [`Payment`]s of the reported [`Deal`]s.
    pub total_paid: Decimal,

    /// Value not covered by the [`Summary::total_paid`] yet, never negative.
    pub total_due: Decimal,

    /// Number of the reported [`Deal`]s.
    pub total_deals: u32,

    /// Number of the reported [`Deal`]s waiting for their money.
    pub pending_deals: u32,

    /// Number of the reported [`Deal`]s paid in full.
    pub fully_paid_deals: u32,

    /// Percentage of the [`Summary::total_sales_deal_value`] being paid.
    ///
    /// Not capped, so may exceed `100` on over-payments.
    pub collection_percentage: Decimal,

    /// Sum of the verified [`Payment`]s received within the reported
    /// [`Interval`].
    pub selected_date_paid_amount: Decimal,
}

/// Per-day averages over a reported [`Interval`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Metrics {
    /// Average [`Summary::total_sales_deal_value`] per day.
    pub daily_average_deal_value: Decimal,

    /// Average [`Summary::total_paid`] per day.
    pub daily_average_collection: Decimal,
}

/// Sales report over an [`Interval`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    /// Overall [`Summary`].
    pub summary: Summary,

    /// [`Summary`] per work type.
    pub by_work_type: BTreeMap<work_type::Id, Summary>,

    /// [`Summary`] per source type.
    pub by_source_type: BTreeMap<source_type::Id, Summary>,

    /// [`Summary`] per [`User`].
    pub by_user: BTreeMap<user::Id, Summary>,

    /// [`Summary`] per [`Team`].
    ///
    /// Sales of [`User`]s outside any [`Team`] are not listed here.
    pub by_team: BTreeMap<team::Id, Summary>,

    /// Per-day [`Metrics`].
    pub metrics: Metrics,
}

/// Aggregates the provided [`Sale`]s and [`Collection`]s into a [`Report`]
/// over the given [`Interval`].
///
/// Inputs falling outside the [`Interval`] are ignored.
#[must_use]
pub fn aggregate(
    sales: &[Sale],
    collections: &[Collection],
    interval: Interval,
) -> Report {
    let mut total = Tally::default();
    let mut by_work_type = BTreeMap::<_, Tally>::new();
    let mut by_source_type = BTreeMap::<_, Tally>::new();
    let mut by_user = BTreeMap::<_, Tally>::new();
    let mut by_team = BTreeMap::<_, Tally>::new();

    for sale in sales.iter().filter(|s| interval.contains(s.deal_date)) {
        let a = sale.attribution;
        total.add_sale(sale);
        by_work_type.entry(a.work_type_id).or_default().add_sale(sale);
        by_source_type
            .entry(a.source_type_id)
            .or_default()
            .add_sale(sale);
        by_user.entry(a.user_id).or_default().add_sale(sale);
        if let Some(team_id) = a.team_id {
            by_team.entry(team_id).or_default().add_sale(sale);
        }
    }

    for c in collections.iter().filter(|c| interval.contains(c.payment_date)) {
        let (a, amount) = (c.attribution, c.amount.value());
        total.collected += amount;
        by_work_type.entry(a.work_type_id).or_default().collected += amount;
        by_source_type.entry(a.source_type_id).or_default().collected +=
            amount;
        by_user.entry(a.user_id).or_default().collected += amount;
        if let Some(team_id) = a.team_id {
            by_team.entry(team_id).or_default().collected += amount;
        }
    }

    let summary = total.summary();
    let days = Decimal::from(interval.days());
    Report {
        metrics: Metrics {
            daily_average_deal_value: money::round(
                summary.total_sales_deal_value / days,
            ),
            daily_average_collection: money::round(summary.total_paid / days),
        },
        summary,
        by_work_type: summarize(by_work_type),
        by_source_type: summarize(by_source_type),
        by_user: summarize(by_user),
        by_team: summarize(by_team),
    }
}

/// Finalizes the provided [`Tally`]s into [`Summary`]s.
fn summarize<K: Ord>(tallies: BTreeMap<K, Tally>) -> BTreeMap<K, Summary> {
    tallies.into_iter().map(|(k, t)| (k, t.summary())).collect()
}

/// Raw sums of a [`Summary`] being accumulated.
#[derive(Clone, Copy, Debug, Default)]
struct Tally {
    /// Sum of [`Sale`] values.
    value: Decimal,

    /// Sum of verified [`Installment`]s.
    paid: Decimal,

    /// Sum of [`Collection`]s.
    collected: Decimal,

    /// Number of [`Sale`]s.
    deals: u32,

    /// Number of pending [`Sale`]s.
    pending: u32,

    /// Number of fully paid [`Sale`]s.
    fully_paid: u32,
}

impl Tally {
    /// Accounts the provided [`Sale`] in this [`Tally`].
    fn add_sale(&mut self, sale: &Sale) {
        self.value += sale.value.amount();
        self.paid += sale.paid();
        self.deals += 1;
        self.pending += u32::from(sale.is_pending());
        self.fully_paid += u32::from(sale.is_fully_paid());
    }

    /// Finalizes this [`Tally`] into a [`Summary`].
    fn summary(self) -> Summary {
        let collection_percentage = if self.value.is_zero() {
            Decimal::ZERO
        } else {
            money::round(self.paid / self.value * Decimal::ONE_HUNDRED)
        };
        Summary {
            total_sales_deal_value: self.value,
            total_paid: self.paid,
            total_due: (self.value - self.paid).max(Decimal::ZERO),
            total_deals: self.deals,
            pending_deals: self.pending,
            fully_paid_deals: self.fully_paid,
            collection_percentage,
            selected_date_paid_amount: self.collected,
        }
    }
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use rust_decimal::Decimal;

    use crate::domain::{
        classification::{source_type, work_type},
        deal, payment,
        payment::StatusKind,
        period::{Interval, Period},
        team, user,
    };

    use super::{aggregate, Attribution, Collection, Installment, Sale};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn january() -> Interval {
        Period::custom_range("2024-01-01", "2024-01-31")
            .unwrap()
            .resolve(DateTime::now())
            .unwrap()
    }

    fn at(s: &str) -> DateTime {
        DateTime::from_rfc3339(s).unwrap()
    }

    fn attribution() -> Attribution {
        Attribution {
            user_id: user::Id::new(),
            team_id: Some(team::Id::new()),
            work_type_id: work_type::Id::new(),
            source_type_id: source_type::Id::new(),
        }
    }

    fn sale(
        value: &str,
        installments: &[(&str, StatusKind)],
        attribution: Attribution,
    ) -> Sale {
        Sale {
            deal_id: deal::Id::new(),
            value: deal::Value::new(decimal(value)).unwrap(),
            deal_date: at("2024-01-10T09:00:00Z").coerce(),
            attribution,
            installments: installments
                .iter()
                .map(|(amount, status)| Installment {
                    amount: payment::Amount::new(decimal(amount)).unwrap(),
                    status: *status,
                })
                .collect(),
        }
    }

    fn collection(amount: &str, paid_at: &str, a: Attribution) -> Collection {
        Collection {
            amount: payment::Amount::new(decimal(amount)).unwrap(),
            payment_date: at(paid_at).coerce(),
            attribution: a,
        }
    }

    #[test]
    fn partially_paid_deal() {
        let a = attribution();
        let sales = [sale("1000", &[("400", StatusKind::Verified)], a)];
        let collections =
            [collection("400", "2024-01-12T10:00:00Z", a)];

        let report = aggregate(&sales, &collections, january());
        let s = report.summary;

        assert_eq!(s.total_sales_deal_value, decimal("1000"));
        assert_eq!(s.total_paid, decimal("400"));
        assert_eq!(s.total_due, decimal("600"));
        assert_eq!(s.total_deals, 1);
        assert_eq!(s.pending_deals, 0);
        assert_eq!(s.fully_paid_deals, 0);
        assert_eq!(s.collection_percentage, decimal("40"));
        assert_eq!(s.selected_date_paid_amount, decimal("400"));
    }

    #[test]
    fn counts_only_verified_payments() {
        let a = attribution();
        let sales = [sale(
            "500",
            &[
                ("200", StatusKind::Verified),
                ("300", StatusKind::Pending),
                ("100", StatusKind::Denied),
            ],
            a,
        )];

        let s = aggregate(&sales, &[], january()).summary;

        assert_eq!(s.total_paid, decimal("200"));
        assert_eq!(s.total_due, decimal("300"));
        assert_eq!(s.pending_deals, 0);
        assert_eq!(s.fully_paid_deals, 0);
    }

    #[test]
    fn detects_pending_and_fully_paid_deals() {
        let a = attribution();
        let sales = [
            sale("100", &[], a),
            sale("100", &[("100", StatusKind::Pending)], a),
            sale("100", &[("100", StatusKind::Denied)], a),
            sale(
                "100",
                &[("60", StatusKind::Verified), ("40", StatusKind::Verified)],
                a,
            ),
            sale("0", &[], a),
        ];

        let s = aggregate(&sales, &[], january()).summary;

        assert_eq!(s.total_deals, 5);
        assert_eq!(s.pending_deals, 2);
        assert_eq!(s.fully_paid_deals, 2);
        assert_eq!(s.total_due, decimal("300"));
    }

    #[test]
    fn over_payment_is_not_capped() {
        let a = attribution();
        let sales = [sale("100", &[("150", StatusKind::Verified)], a)];

        let s = aggregate(&sales, &[], january()).summary;

        assert_eq!(s.total_due, Decimal::ZERO);
        assert_eq!(s.collection_percentage, decimal("150"));
        assert_eq!(s.fully_paid_deals, 1);
    }

    #[test]
    fn zero_value_gives_zero_percentage() {
        let a = attribution();
        let s = aggregate(&[sale("0", &[], a)], &[], january()).summary;

        assert_eq!(s.collection_percentage, Decimal::ZERO);
        assert_eq!(s.total_due, Decimal::ZERO);
    }

    #[test]
    fn rounds_collection_percentage() {
        let a = attribution();
        let sales = [sale("3", &[("1", StatusKind::Verified)], a)];

        let s = aggregate(&sales, &[], january()).summary;

        assert_eq!(s.collection_percentage, decimal("33.33"));
    }

    #[test]
    fn collections_are_bound_by_payment_date() {
        let a = attribution();
        let collections = [
            collection("250", "2024-01-31T23:59:59Z", a),
            collection("100", "2024-02-01T00:00:00Z", a),
            collection("50", "2023-12-31T23:59:59Z", a),
        ];

        let s = aggregate(&[], &collections, january()).summary;

        assert_eq!(s.selected_date_paid_amount, decimal("250"));
        assert_eq!(s.total_deals, 0);
        assert_eq!(s.total_paid, Decimal::ZERO);
    }

    #[test]
    fn ignores_deals_outside_interval() {
        let a = attribution();
        let mut old = sale("700", &[], a);
        old.deal_date = at("2023-12-31T10:00:00Z").coerce();

        let report = aggregate(&[old], &[], january());

        assert_eq!(report.summary.total_deals, 0);
        assert!(report.by_user.is_empty());
    }

    #[test]
    fn breaks_down_by_every_key() {
        let (ram, sita) = (attribution(), attribution());
        let teamless = Attribution {
            team_id: None,
            ..attribution()
        };
        let sales = [
            sale("1000", &[("400", StatusKind::Verified)], ram),
            sale("200", &[], ram),
            sale("500", &[("500", StatusKind::Verified)], sita),
            sale("300", &[], teamless),
        ];
        let collections = [collection("500", "2024-01-20T00:00:00Z", sita)];

        let report = aggregate(&sales, &collections, january());

        assert_eq!(report.by_user.len(), 3);
        assert_eq!(report.by_work_type.len(), 3);
        assert_eq!(report.by_source_type.len(), 3);
        assert_eq!(report.by_team.len(), 2);

        let r = report.by_user[&ram.user_id];
        assert_eq!(r.total_deals, 2);
        assert_eq!(r.total_sales_deal_value, decimal("1200"));
        assert_eq!(r.total_paid, decimal("400"));
        assert_eq!(r.pending_deals, 1);
        assert_eq!(r.collection_percentage, decimal("33.33"));

        let s = report.by_team[&sita.team_id.unwrap()];
        assert_eq!(s.fully_paid_deals, 1);
        assert_eq!(s.selected_date_paid_amount, decimal("500"));

        let total: Decimal = report
            .by_user
            .values()
            .map(|s| s.total_sales_deal_value)
            .sum();
        assert_eq!(total, report.summary.total_sales_deal_value);
    }

    #[test]
    fn computes_daily_averages() {
        let a = attribution();
        let sales = [sale("1000", &[("400", StatusKind::Verified)], a)];

        let m = aggregate(&sales, &[], january()).metrics;

        assert_eq!(m.daily_average_deal_value, decimal("32.26"));
        assert_eq!(m.daily_average_collection, decimal("12.90"));
    }

    #[test]
    fn aggregates_nothing() {
        let report = aggregate(&[], &[], january());

        assert_eq!(report.summary, super::Summary::default());
        assert_eq!(report.metrics, super::Metrics::default());
    }
}
