//! [`Query`] collection related to the [`SourceType`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Organization, Query};
use crate::domain::{classification::source_type, organization, SourceType};

use super::DatabaseQuery;

/// Queries a [`SourceType`] by its [`source_type::Id`].
pub type ById = DatabaseQuery<By<Option<SourceType>, source_type::Id>>;

/// Queries all the [`SourceType`]s of an [`Organization`].
pub type ByOrganization =
    DatabaseQuery<By<Vec<SourceType>, organization::Id>>;
