//! [`Query`] collection related to the multiple [`Team`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Organization, Query};
use crate::domain::{organization, Team};

use super::DatabaseQuery;

/// Queries all the [`Team`]s of an [`Organization`].
pub type ByOrganization = DatabaseQuery<By<Vec<Team>, organization::Id>>;
