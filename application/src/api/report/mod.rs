//! Reports definitions.

pub mod sales;

pub use self::sales::SalesSummary;
