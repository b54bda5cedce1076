//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::domain::{organization, User};

use super::DatabaseQuery;

/// Queries all the active [`User`]s of an [`Organization`].
///
/// [`Organization`]: crate::domain::Organization
pub type ByOrganization = DatabaseQuery<By<Vec<User>, organization::Id>>;
