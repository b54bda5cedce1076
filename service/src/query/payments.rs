//! [`Query`] collection related to the multiple [`Payment`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Deal, Query};
use crate::domain::{deal, Payment};

use super::DatabaseQuery;

/// Queries all the [`Payment`]s made against a [`Deal`], in the order they
/// were received.
pub type ByDeal = DatabaseQuery<By<Vec<Payment>, deal::Id>>;
