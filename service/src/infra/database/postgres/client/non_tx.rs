//! [`NonTx`] client definitions.

use std::sync::Arc;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{delegate_connection, get_or_init};

/// Non-transactional Postgres database client.
///
/// Acquires its [`Connection`] from the [`connection::Pool`] on first use and
/// keeps it until a [`Tx`] takes it over.
///
/// [`Tx`]: super::Tx
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire [`Connection`]s from.
    pub(crate) pool: connection::Pool,

    /// Acquired [`Connection`], if any.
    connection: Arc<RwLock<Option<connection::NonTx>>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client from the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            connection: Arc::default(),
        }
    }

    /// Returns the underlying [`Connection`] of this [`NonTx`] client,
    /// acquiring it if necessary.
    pub(crate) async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        get_or_init(&self.connection, || async {
            self.pool
                .get()
                .await
                .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                .map_err(tracerr::map_from)
        })
        .await
    }

    /// Takes the underlying [`Connection`] from this [`NonTx`] client, so the
    /// next use acquires a new one.
    #[must_use]
    pub(crate) async fn take_connection(&self) -> Option<connection::NonTx> {
        self.connection.write().await.take()
    }
}

delegate_connection!(NonTx);
