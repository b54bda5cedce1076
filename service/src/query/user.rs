//! [`Query`] collection related to a single [`User`].

use common::operations::By;

use crate::domain::{user, User};
#[cfg(doc)]
use crate::Query;

use super::DatabaseQuery;

/// Queries an active [`User`] by its [`user::Id`].
///
/// Deleted [`User`]s are never returned, though their `Deal`s and
/// commissions stay intact.
pub type ById = DatabaseQuery<By<Option<User>, user::Id>>;
