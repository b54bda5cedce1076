//! [`User`] definitions.

pub mod session;

use std::{str::FromStr, sync::LazyLock};

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{organization, team};
#[cfg(doc)]
use crate::domain::{Organization, Team};

pub use self::session::Session;

/// Member of an [`Organization`].
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// ID of the [`Organization`] this [`User`] is a member of.
    pub organization_id: organization::Id,

    /// ID of the [`Team`] this [`User`] is reported within, if any.
    pub team_id: Option<team::Id>,

    /// [`Role`] of this [`User`] in its [`Organization`].
    pub role: Role,

    /// Full [`Name`] of this [`User`].
    ///
    /// Unique (case-insensitively) within the [`Organization`].
    pub name: Name,

    /// [`Login`] of this [`User`] to sign in with.
    pub login: Login,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`Email`] of this [`User`].
    ///
    /// Unique (case-insensitively) within the [`Organization`].
    pub email: Email,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] was deleted.
    pub deleted_at: Option<DeletionDateTime>,
}

impl User {
    /// Indicates whether this [`User`] may act upon the data of the provided
    /// `other` [`User`].
    #[must_use]
    pub fn oversees(&self, other: &User) -> bool {
        self.organization_id == other.organization_id
            && (self.id == other.id || self.role.is_privileged())
    }
}

define_kind! {
    #[doc = "Role of a `User` within its `Organization`."]
    enum Role {
        #[doc = "Manages the `Organization`, its members and commissions."]
        Admin = 1,

        #[doc = "Reviews payments and watches over every sale."]
        Supervisor = 2,

        #[doc = "Makes deals and sees own sales only."]
        Salesperson = 3,
    }
}

impl Role {
    /// Indicates whether this [`Role`] sees and reviews the sales of other
    /// [`User`]s.
    #[must_use]
    pub fn is_privileged(self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }
}

/// ID of a [`User`].
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

/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Login of a [`User`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Login(String);

impl Login {
    /// Creates a new [`Login`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `login` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(login: impl Into<String>) -> Self {
        Self(login.into())
    }

    /// Creates a new [`Login`] if the given `login` is valid.
    #[must_use]
    pub fn new(login: impl Into<String>) -> Option<Self> {
        let login = login.into();
        Self::check(&login).then_some(Self(login))
    }

    /// Checks whether the given `login` is a valid [`Login`].
    fn check(login: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Login`] invariants:
        /// - Must be between 3 and 64 characters long;
        /// - Must consist of letters, digits, `.`, `_` or `-` only;
        /// - Must start with a letter or a digit.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}][\p{L}\p{N}._-]{2,63}$")
                .expect("valid regex")
        });

        REGEX.is_match(login.as_ref())
    }
}

impl FromStr for Login {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Login`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `password` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    ///
    /// [`bcrypt`] ignores everything past 72 bytes.
    fn check(password: impl AsRef<str>) -> bool {
        (8..=72).contains(&password.as_ref().len())
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [`bcrypt`] hash of a [`User`]'s [`Password`].
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with [`bcrypt`].
    ///
    /// CPU-heavy, so should be run on a blocking thread in async contexts.
    ///
    /// # Errors
    ///
    /// If [`bcrypt`] fails to hash the [`Password`].
    pub fn new(password: &Password) -> Result<Self, HashingError> {
        bcrypt::hash(&password.0, bcrypt::DEFAULT_COST)
            .map(Self)
            .map_err(HashingError)
    }

    /// Checks whether the given [`Password`] matches this [`PasswordHash`].
    ///
    /// Malformed hashes never match.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        bcrypt::verify(&password.0, &self.0).unwrap_or(false)
    }
}

/// Error of hashing a [`Password`].
#[derive(Debug, Display, Error)]
#[display("Failed to hash `Password`: {_0}")]
pub struct HashingError(bcrypt::BcryptError);

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `address` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] was deleted.
pub type DeletionDateTime = DateTimeOf<(User, unit::Deletion)>;

#[cfg(test)]
mod spec {
    use super::{Email, Login, Name, Password, PasswordHash, Role};

    #[test]
    fn validates_login() {
        assert!(Login::new("j.doe").is_some());
        assert!(Login::new("sales_42").is_some());

        assert!(Login::new("jd").is_none());
        assert!(Login::new(".doe").is_none());
        assert!(Login::new("john doe").is_none());
    }

    #[test]
    fn validates_name_and_email() {
        assert!(Name::new("Ram Bahadur").is_some());
        assert!(Name::new(" Ram").is_none());
        assert!(Name::new("").is_none());

        assert!(Email::new("ram@example.com").is_some());
        assert!(Email::new("ram.example.com").is_none());
    }

    #[test]
    fn verifies_password_hash() {
        let password = Password::new("correct horse").unwrap();
        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("battery staple").unwrap()));
        assert!(Password::new("short").is_none());
    }

    #[test]
    fn privileged_roles() {
        assert!(Role::Admin.is_privileged());
        assert!(Role::Supervisor.is_privileged());
        assert!(!Role::Salesperson.is_privileged());
        assert_eq!("SALESPERSON".parse::<Role>().unwrap(), Role::Salesperson);
    }

    #[test]
    fn roles_roundtrip_through_their_names() {
        for role in Role::ALL {
            assert_eq!(role.to_string().parse::<Role>().unwrap(), *role);
        }
    }
}
