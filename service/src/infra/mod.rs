//! Infrastructure layer.
//!
//! Storage of organizations, deals, payments, commissions and currency rates.

pub mod database;

pub use self::database::Database;
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};
