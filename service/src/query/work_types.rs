//! [`Query`] collection related to the [`WorkType`]s.

use common::operations::By;

#[cfg(doc)]
use crate::{domain::Organization, Query};
use crate::domain::{classification::work_type, organization, WorkType};

use super::DatabaseQuery;

/// Queries a [`WorkType`] by its [`work_type::Id`].
pub type ById = DatabaseQuery<By<Option<WorkType>, work_type::Id>>;

/// Queries all the [`WorkType`]s of an [`Organization`].
pub type ByOrganization = DatabaseQuery<By<Vec<WorkType>, organization::Id>>;
