//! [`Tx`] client definitions.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

use super::{delegate_connection, get_or_init, NonTx};

/// Transactional Postgres database client.
///
/// Starts its transaction lazily on first use, reusing the [`Connection`]
/// of the [`NonTx`] client it was created from, if there is one.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire a [`Connection`] from.
    pool: connection::Pool,

    /// [`NonTx`] client to take the [`Connection`] from, until taken.
    origin: Arc<Mutex<Option<NonTx>>>,

    /// Started transaction, if any.
    tx: Arc<RwLock<Option<connection::Tx>>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(Mutex::new(Some(client))),
            tx: Arc::default(),
        }
    }

    /// Returns the underlying [`Connection`] of this [`Tx`] client, starting
    /// the transaction if necessary.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        get_or_init(&self.tx, || async {
            let reused = match self.origin.lock().await.take() {
                Some(non_tx) => non_tx.take_connection().await,
                None => None,
            };
            let conn = match reused {
                Some(conn) => conn,
                None => self
                    .pool
                    .get()
                    .await
                    .map_err(tracerr::from_and_wrap!(=> postgres::Error))
                    .map_err(tracerr::map_from)?,
            };
            connection::Tx::from_non_tx(conn)
                .await
                .map_err(tracerr::wrap!())
        })
        .await
    }

    /// Commits this [`Tx`] client.
    ///
    /// Does nothing if the transaction hasn't been started.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction of this [`Tx`] client.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        let Some(tx) = self.tx.write().await.take() else {
            return Ok(());
        };
        tx.commit().await.map_err(tracerr::wrap!())
    }
}

delegate_connection!(Tx);
