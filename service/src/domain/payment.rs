//! [`Payment`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, money, unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{deal, user};
#[cfg(doc)]
use crate::domain::{Deal, User};

/// Installment received against a [`Deal`].
#[derive(Clone, Debug)]
pub struct Payment {
    /// ID of this [`Payment`].
    pub id: Id,

    /// ID of the [`Deal`] this [`Payment`] is made against.
    pub deal_id: deal::Id,

    /// Received [`Amount`].
    pub amount: Amount,

    /// [`DateTime`] when this [`Payment`] was received.
    pub payment_date: PaymentDateTime,

    /// Reference to a receipt of this [`Payment`], if any.
    pub receipt: Option<Receipt>,

    /// Free-form [`Remarks`] about this [`Payment`].
    pub remarks: Option<Remarks>,

    /// Review [`Status`] of this [`Payment`].
    pub status: Status,

    /// Indicator whether this [`Payment`] was changed after its creation.
    pub is_edited: bool,

    /// [`DateTime`] when this [`Payment`] was created.
    pub created_at: CreationDateTime,
}

impl Payment {
    /// Indicates whether this [`Payment`] counts towards collected money.
    #[must_use]
    pub fn is_verified(&self) -> bool {
        matches!(self.status, Status::Verified { .. })
    }

    /// Indicates whether this [`Payment`] still awaits a review.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.status, Status::Pending)
    }

    /// Reviews this [`Payment`] with the provided [`Verdict`].
    ///
    /// # Errors
    ///
    /// If this [`Payment`] has been reviewed already: there is no way back
    /// from [`Status::Verified`] or [`Status::Denied`].
    pub fn review(
        &mut self,
        verdict: Verdict,
        by: user::Id,
        at: ReviewDateTime,
    ) -> Result<(), AlreadyReviewed> {
        if !self.is_pending() {
            return Err(AlreadyReviewed(self.id));
        }
        self.status = match verdict {
            Verdict::Verify => Status::Verified { by, at },
            Verdict::Deny { remarks } => Status::Denied { by, at, remarks },
        };
        Ok(())
    }
}

/// Review status of a [`Payment`].
///
/// Both [`Status::Verified`] and [`Status::Denied`] are terminal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Status {
    /// Awaits a review.
    Pending,

    /// Confirmed as received.
    Verified {
        /// ID of the [`User`] who verified the [`Payment`].
        by: user::Id,

        /// [`DateTime`] when the [`Payment`] was verified.
        at: ReviewDateTime,
    },

    /// Rejected as not received.
    Denied {
        /// ID of the [`User`] who denied the [`Payment`].
        by: user::Id,

        /// [`DateTime`] when the [`Payment`] was denied.
        at: ReviewDateTime,

        /// Reason of the denial.
        remarks: Remarks,
    },
}

impl Status {
    /// Returns [`StatusKind`] of this [`Status`].
    #[must_use]
    pub fn kind(&self) -> StatusKind {
        match self {
            Self::Pending => StatusKind::Pending,
            Self::Verified { .. } => StatusKind::Verified,
            Self::Denied { .. } => StatusKind::Denied,
        }
    }

    /// Returns ID of the [`User`] who reviewed the [`Payment`], if any.
    #[must_use]
    pub fn reviewed_by(&self) -> Option<user::Id> {
        match self {
            Self::Pending => None,
            Self::Verified { by, .. } | Self::Denied { by, .. } => Some(*by),
        }
    }

    /// Returns [`DateTime`] when the [`Payment`] was reviewed, if it was.
    #[must_use]
    pub fn reviewed_at(&self) -> Option<ReviewDateTime> {
        match self {
            Self::Pending => None,
            Self::Verified { at, .. } | Self::Denied { at, .. } => Some(*at),
        }
    }

    /// Assembles a [`Status`] out of its stored parts.
    ///
    /// [`None`] is returned if the parts don't match the [`StatusKind`].
    #[must_use]
    pub fn from_parts(
        kind: StatusKind,
        by: Option<user::Id>,
        at: Option<ReviewDateTime>,
        remarks: Option<Remarks>,
    ) -> Option<Self> {
        Some(match kind {
            StatusKind::Pending => Self::Pending,
            StatusKind::Verified => Self::Verified { by: by?, at: at? },
            StatusKind::Denied => Self::Denied {
                by: by?,
                at: at?,
                remarks: remarks?,
            },
        })
    }

    /// Returns the denial [`Remarks`], if the [`Payment`] was denied.
    #[must_use]
    pub fn denial_remarks(&self) -> Option<&Remarks> {
        match self {
            Self::Denied { remarks, .. } => Some(remarks),
            Self::Pending | Self::Verified { .. } => None,
        }
    }
}

define_kind! {
    #[doc = "Kind of a `Payment` review status."]
    enum StatusKind {
        #[doc = "Awaits a review."]
        Pending = 1,

        #[doc = "Confirmed as received."]
        Verified = 2,

        #[doc = "Rejected as not received."]
        Denied = 3,
    }
}

/// Outcome of a [`Payment`] review.
#[derive(Clone, Debug)]
pub enum Verdict {
    /// Confirm the [`Payment`] as received.
    Verify,

    /// Reject the [`Payment`].
    Deny {
        /// Reason of the denial.
        remarks: Remarks,
    },
}

/// Error of reviewing an already reviewed [`Payment`].
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("`Payment(id: {_0})` is reviewed already")]
pub struct AlreadyReviewed(#[error(not(source))] pub Id);

/// ID of a [`Payment`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Strictly positive amount of a [`Payment`].
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Amount(Decimal);

impl Amount {
    /// Creates a new [`Amount`] if the given `amount` is positive and fits
    /// into [`money::MAX`].
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        let amount = money::round(amount);
        (amount > Decimal::ZERO && amount <= money::MAX)
            .then_some(Self(amount))
    }

    /// Returns the inner value of this [`Amount`].
    #[must_use]
    pub fn value(self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Amount`")
    }
}

/// Reference to a receipt of a [`Payment`] (a document number or a link).
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Receipt(String);

impl Receipt {
    /// Creates a new [`Receipt`] if the given `reference` is valid.
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Option<Self> {
        let reference = reference.into();
        (reference.trim() == reference
            && !reference.is_empty()
            && reference.len() <= 1024)
            .then_some(Self(reference))
    }
}

impl FromStr for Receipt {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Receipt`")
    }
}

/// Free-form remarks about a [`Payment`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Remarks(String);

impl Remarks {
    /// Creates new [`Remarks`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        (!text.trim().is_empty() && text.len() <= 2048).then_some(Self(text))
    }
}

impl FromStr for Remarks {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Remarks`")
    }
}

/// Marker type describing the moment a [`Payment`] is received.
#[derive(Clone, Copy, Debug)]
pub struct Reception;

/// Marker type describing the moment a [`Payment`] is reviewed.
#[derive(Clone, Copy, Debug)]
pub struct Review;

/// [`DateTime`] when a [`Payment`] was received.
pub type PaymentDateTime = DateTimeOf<(Payment, Reception)>;

/// [`DateTime`] when a [`Payment`] was reviewed.
pub type ReviewDateTime = DateTimeOf<(Payment, Review)>;

/// [`DateTime`] when a [`Payment`] was created.
pub type CreationDateTime = DateTimeOf<(Payment, unit::Creation)>;

#[cfg(test)]
mod spec {
    use common::{money, DateTime};
    use rust_decimal::Decimal;

    use crate::domain::{deal, user};

    use super::{
        Amount, Id, Payment, PaymentDateTime, Remarks, Status, StatusKind,
        Verdict,
    };

    fn payment() -> Payment {
        Payment {
            id: Id::new(),
            deal_id: deal::Id::new(),
            amount: Amount::new(Decimal::ONE_HUNDRED).unwrap(),
            payment_date: PaymentDateTime::now(),
            receipt: None,
            remarks: None,
            status: Status::Pending,
            is_edited: false,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn amount_is_positive() {
        assert!(Amount::new(Decimal::ZERO).is_none());
        assert!(Amount::new(Decimal::NEGATIVE_ONE).is_none());
        assert!(Amount::new("0.001".parse().unwrap()).is_none());
        assert!(Amount::new("0.005".parse().unwrap()).is_some());
    }

    #[test]
    fn amount_fits_numeric_column() {
        assert!(Amount::new(money::MAX).is_some());
        assert!(Amount::new(money::MAX + Decimal::ONE).is_none());
        assert!(Amount::new(Decimal::MAX).is_none());
    }

    #[test]
    fn verifies_pending() {
        let reviewer = user::Id::new();
        let mut p = payment();

        p.review(Verdict::Verify, reviewer, DateTime::now().coerce())
            .unwrap();

        assert!(p.is_verified());
        assert_eq!(p.status.kind(), StatusKind::Verified);
        assert_eq!(p.status.reviewed_by(), Some(reviewer));
        assert!(p.status.denial_remarks().is_none());
    }

    #[test]
    fn denies_pending_with_remarks() {
        let mut p = payment();
        let remarks = Remarks::new("bounced cheque").unwrap();

        p.review(
            Verdict::Deny {
                remarks: remarks.clone(),
            },
            user::Id::new(),
            DateTime::now().coerce(),
        )
        .unwrap();

        assert_eq!(p.status.kind(), StatusKind::Denied);
        assert_eq!(p.status.denial_remarks(), Some(&remarks));
        assert!(!p.is_verified());
    }

    #[test]
    fn reviewed_status_is_terminal() {
        let mut p = payment();
        p.review(Verdict::Verify, user::Id::new(), DateTime::now().coerce())
            .unwrap();

        let denied = p.review(
            Verdict::Deny {
                remarks: Remarks::new("oops").unwrap(),
            },
            user::Id::new(),
            DateTime::now().coerce(),
        );

        assert!(denied.is_err());
        assert!(p.is_verified());
    }
}
