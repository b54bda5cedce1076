//! [`Deal`] definitions.

use std::str::FromStr;

#[cfg(doc)]
use common::DateTime;
use common::{money, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    classification::{source_type, work_type},
    organization, user, User,
};
#[cfg(doc)]
use crate::domain::{
    classification::{SourceType, WorkType},
    Organization, Payment,
};

/// Sale made by a [`User`] to a [`Client`].
///
/// [`Deal`] owns its [`Payment`]s, so it cannot be deleted while it has any.
#[derive(Clone, Debug)]
pub struct Deal {
    /// ID of this [`Deal`].
    pub id: Id,

    /// ID of the [`Organization`] this [`Deal`] belongs to.
    pub organization_id: organization::Id,

    /// ID of the [`User`] this [`Deal`] is assigned to.
    pub user_id: user::Id,

    /// [`Client`] of this [`Deal`].
    pub client: Client,

    /// ID of the [`WorkType`] this [`Deal`] is classified with.
    pub work_type_id: work_type::Id,

    /// ID of the [`SourceType`] this [`Deal`] is classified with.
    pub source_type_id: source_type::Id,

    /// [`Value`] of this [`Deal`] in the [`Organization`]'s currency.
    pub value: Value,

    /// [`DateTime`] when this [`Deal`] was made.
    pub deal_date: DealDateTime,

    /// [`DateTime`] this [`Deal`] is expected to be fully paid by, if any.
    pub due_date: Option<DueDateTime>,

    /// Free-form [`Remarks`] about this [`Deal`].
    pub remarks: Option<Remarks>,

    /// Indicator whether this [`Deal`] was changed after its creation.
    pub is_edited: bool,

    /// [`DateTime`] when this [`Deal`] was created.
    pub created_at: CreationDateTime,
}

impl Deal {
    /// Indicates whether the provided [`User`] may act upon this [`Deal`].
    ///
    /// [`User`]s with a privileged [`user::Role`] act upon any [`Deal`] of
    /// their [`Organization`], others upon their own ones only.
    #[must_use]
    pub fn is_accessible_by(&self, user: &User) -> bool {
        self.organization_id == user.organization_id
            && (self.user_id == user.id || user.role.is_privileged())
    }
}

/// ID of a [`Deal`].
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

/// Non-negative monetary value of a [`Deal`].
#[derive(Clone, Copy, Debug, Display, Eq, Into, Ord, PartialEq, PartialOrd)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Value(Decimal);

impl Value {
    /// Creates a new [`Value`] if the given `amount` is not negative and
    /// fits into [`money::MAX`].
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        let amount = money::round(amount);
        (Decimal::ZERO..=money::MAX)
            .contains(&amount)
            .then_some(Self(amount))
    }

    /// Returns the amount of this [`Value`].
    #[must_use]
    pub fn amount(self) -> Decimal {
        self.0
    }
}

impl FromStr for Value {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Value`")
    }
}

/// Name of a [`Deal`]'s client.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Client(String);

impl Client {
    /// Creates a new [`Client`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Client`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Client`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Client {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Client`")
    }
}

/// Free-form remarks about a [`Deal`].
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

/// Marker type describing the moment a [`Deal`] is made.
#[derive(Clone, Copy, Debug)]
pub struct Conclusion;

/// Marker type describing the moment a [`Deal`] is due.
#[derive(Clone, Copy, Debug)]
pub struct Due;

/// [`DateTime`] when a [`Deal`] was made.
pub type DealDateTime = DateTimeOf<(Deal, Conclusion)>;

/// [`DateTime`] a [`Deal`] is expected to be fully paid by.
pub type DueDateTime = DateTimeOf<(Deal, Due)>;

/// [`DateTime`] when a [`Deal`] was created.
pub type CreationDateTime = DateTimeOf<(Deal, unit::Creation)>;

#[cfg(test)]
mod spec {
    use std::sync::LazyLock;

    use common::{money, DateTime};
    use rust_decimal::Decimal;

    use crate::domain::{
        classification::{source_type, work_type},
        organization,
        user::{self, Role},
        User,
    };

    use super::{Client, Deal, Id, Value};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn user(organization_id: organization::Id, role: Role) -> User {
        static HASH: LazyLock<user::PasswordHash> = LazyLock::new(|| {
            user::PasswordHash::new(&user::Password::new("password").unwrap())
                .unwrap()
        });

        User {
            id: user::Id::new(),
            organization_id,
            team_id: None,
            role,
            name: user::Name::new("Sita").unwrap(),
            login: user::Login::new("sita").unwrap(),
            password_hash: HASH.clone(),
            email: user::Email::new("sita@example.com").unwrap(),
            created_at: DateTime::now().coerce(),
            deleted_at: None,
        }
    }

    fn deal(owner: &User) -> Deal {
        Deal {
            id: Id::new(),
            organization_id: owner.organization_id,
            user_id: owner.id,
            client: Client::new("Acme").unwrap(),
            work_type_id: work_type::Id::new(),
            source_type_id: source_type::Id::new(),
            value: Value::new(decimal("1000")).unwrap(),
            deal_date: DateTime::now().coerce(),
            due_date: None,
            remarks: None,
            is_edited: false,
            created_at: DateTime::now().coerce(),
        }
    }

    #[test]
    fn accessible_by_owner_and_privileged_only() {
        let org = organization::Id::new();
        let owner = user(org, Role::Salesperson);
        let deal = deal(&owner);

        assert!(deal.is_accessible_by(&owner));
        assert!(deal.is_accessible_by(&user(org, Role::Supervisor)));
        assert!(deal.is_accessible_by(&user(org, Role::Admin)));
        assert!(!deal.is_accessible_by(&user(org, Role::Salesperson)));
        assert!(
            !deal.is_accessible_by(&user(organization::Id::new(), Role::Admin))
        );
    }

    #[test]
    fn value_is_non_negative() {
        assert_eq!(Value::new(Decimal::ZERO).unwrap().amount(), Decimal::ZERO);
        assert_eq!(
            Value::new(decimal("1000.005")).unwrap().amount(),
            decimal("1000.01"),
        );
        assert!(Value::new(decimal("-0.01")).is_none());
        assert!(Value::new(money::MAX).is_some());
        assert!(Value::new(money::MAX + Decimal::ONE).is_none());
        assert!("-5".parse::<Value>().is_err());
        assert!("abc".parse::<Value>().is_err());
    }
}
