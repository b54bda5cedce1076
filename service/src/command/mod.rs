//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_deal;
pub mod create_organization;
pub mod create_payment;
pub mod create_source_type;
pub mod create_team;
pub mod create_user;
pub mod create_user_session;
pub mod create_work_type;
pub mod delete_deal;
pub mod delete_payment;
pub mod delete_user;
pub mod review_payment;
pub mod save_commission;
pub mod update_deal;
pub mod update_user;

use tracerr::Traced;

use crate::infra::database;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession, create_deal::CreateDeal,
    create_organization::CreateOrganization, create_payment::CreatePayment,
    create_source_type::CreateSourceType, create_team::CreateTeam,
    create_user::CreateUser, create_user_session::CreateUserSession,
    create_work_type::CreateWorkType, delete_deal::DeleteDeal,
    delete_payment::DeletePayment, delete_user::DeleteUser,
    review_payment::ReviewPayment, save_commission::SaveCommission,
    update_deal::UpdateDeal, update_user::UpdateUser,
};

/// Returns a function mapping a violation of the provided unique `constraint`
/// into the `occupied` error, and passing through any other error as is.
fn on_unique_violation<E>(
    constraint: &'static str,
    occupied: impl FnOnce() -> E,
) -> impl FnOnce(Traced<database::Error>) -> Traced<E>
where
    E: From<database::Error>,
{
    move |e| {
        if e.as_ref().is_unique_violation(Some(constraint)) {
            tracerr::new!(occupied())
        } else {
            tracerr::map_from(e)
        }
    }
}
