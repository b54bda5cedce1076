//! GraphQL [`Subscription`]s definitions.

use std::time::Duration;

use common::DateTime;
use futures::{
    stream::{self, BoxStream},
    FutureExt as _, StreamExt as _,
};
use juniper::graphql_subscription;

use crate::{context, Context, Error};

/// Root of all GraphQL subscriptions.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

impl Subscription {
    /// Name of the [`tracing::Span`] for the subscriptions.
    const SPAN_NAME: &'static str = "GraphQL subscription";
}

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Notifies once the current `UserSession` expires, so the client may
    /// sign in again before issuing further operations.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the current `UserSession` is missing or
    ///                              has expired.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "sessionExpiry",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn session_expiry(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<DateTime, Error>>, Error> {
        let session = ctx.current_session().await?;
        let expires_at = session.expires_at;
        let now = DateTime::now();
        let timeout = if expires_at > now {
            expires_at - now
        } else {
            Duration::ZERO
        };
        Ok(stream::once(tokio::time::sleep(timeout).map(move |()| {
            tracing::debug!(?expires_at, "`UserSession` expired");
            Err(context::AuthError::AuthorizationRequired.into())
        }))
        .boxed())
    }
}
