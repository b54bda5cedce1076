//! Postgres database client definitions.

pub mod non_tx;
pub mod tx;

use std::future::Future;

use tokio::sync::{RwLock, RwLockReadGuard};
use tracerr::Traced;

use crate::infra::database;

pub use self::{non_tx::NonTx, tx::Tx};

/// Returns the value stored in the provided `slot`, initializing it with the
/// provided `init` first, if the `slot` is empty.
async fn get_or_init<'s, T, F, Fut>(
    slot: &'s RwLock<Option<T>>,
    init: F,
) -> Result<RwLockReadGuard<'s, T>, Traced<database::Error>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, Traced<database::Error>>>,
{
    let read = slot.read().await;
    let guard = if read.is_some() {
        read
    } else {
        drop(read);

        let mut write = slot.write().await;
        if write.is_none() {
            *write = Some(init().await.map_err(tracerr::wrap!())?);
        }
        write.downgrade()
    };

    Ok(RwLockReadGuard::map(guard, |v| {
        v.as_ref()
            .expect("slot cannot be emptied while guard is alive")
    }))
}

/// Implements [`Connection`] for a client by delegating to its lazily
/// acquired underlying [`Connection`].
///
/// [`Connection`]: super::Connection
macro_rules! delegate_connection {
    ($client:ty) => {
        impl $crate::infra::database::postgres::Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Vec<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<
                Option<::tokio_postgres::Row>,
                ::tracerr::Traced<$crate::infra::database::Error>,
            >
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ::tokio_postgres::types::ToSql + Sync)],
            ) -> Result<u64, ::tracerr::Traced<$crate::infra::database::Error>>
            where
                T: ::tokio_postgres::ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(::tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                stmt: &str,
            ) -> Result<(), ::tracerr::Traced<$crate::infra::database::Error>>
            {
                self.connection()
                    .await
                    .map_err(::tracerr::wrap!())?
                    .batch_exec(stmt)
                    .await
                    .map_err(::tracerr::wrap!())
            }
        }
    };
}
pub(crate) use delegate_connection;
