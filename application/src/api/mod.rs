//! GraphQL API definitions.

pub mod classification;
pub mod commission;
pub mod currency;
pub mod deal;
mod mutation;
pub mod organization;
pub mod payment;
mod query;
pub mod report;
pub mod scalar;
mod status;
mod subscription;
pub mod team;
pub mod user;

use crate::define_error;

pub use self::{
    classification::{
        source_type::{self, SourceType},
        work_type::{self, WorkType},
    },
    commission::Commission,
    deal::Deal,
    mutation::Mutation,
    organization::Organization,
    payment::Payment,
    query::Query,
    report::SalesSummary,
    status::{Failure, FieldError, Status, Validation},
    subscription::Subscription,
    team::Team,
    user::User,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an admin"]
        NotAdmin,

        #[code = "NOT_PRIVILEGED"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an admin or a supervisor"]
        NotPrivileged,
    }
}
