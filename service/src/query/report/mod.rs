//! Report [`Query`]s.
//!
//! [`Query`]: crate::Query

pub mod sales_summary;
