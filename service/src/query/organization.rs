//! [`Query`] collection related to a single [`Organization`].

use common::operations::By;

use crate::domain::{organization, Organization};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an [`Organization`] by its [`organization::Id`].
pub type ById = DatabaseQuery<By<Option<Organization>, organization::Id>>;
