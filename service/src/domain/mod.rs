//! Domain definitions.

pub mod classification;
pub mod commission;
pub mod currency;
pub mod deal;
pub mod organization;
pub mod payment;
pub mod period;
pub mod sales;
pub mod team;
pub mod user;

pub use self::{
    classification::{SourceType, WorkType},
    commission::Commission,
    deal::Deal,
    organization::Organization,
    payment::Payment,
    period::Period,
    team::Team,
    user::User,
};
