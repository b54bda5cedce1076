//! [`SourceType`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(doc)]
use crate::domain::{Deal, Organization};
use crate::domain::organization;

use super::Name;

/// Channel a [`Deal`] came from.
#[derive(Clone, Debug)]
pub struct SourceType {
    /// ID of this [`SourceType`].
    pub id: Id,

    /// ID of the [`Organization`] this [`SourceType`] belongs to.
    pub organization_id: organization::Id,

    /// [`Name`] of this [`SourceType`], unique within its [`Organization`].
    pub name: Name,

    /// [`DateTime`] when this [`SourceType`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`SourceType`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
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

/// [`DateTime`] when a [`SourceType`] was created.
pub type CreationDateTime = DateTimeOf<(SourceType, unit::Creation)>;
