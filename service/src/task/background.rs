//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task::{JoinError, JoinHandle, LocalSet};
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Type-erased error of a [`Task`] running in a [`Background`].
type BoxError = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s.
///
/// Resolves once all the spawned [`Task`]s are done, or fails as soon as any
/// of them fails.
#[derive(Debug, Default)]
pub struct Background {
    /// Set of the spawned [`Task`]s, driven on the current thread.
    set: LocalSet,

    /// Handles of the spawned [`Task`]s.
    handles: Vec<JoinHandle<Result<(), BoxError>>>,
}

impl Background {
    /// Spawns a new named [`Task`] inside this [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `task::{name}` in background");
        self.handles.push(self.set.spawn_local(future.map_err(move |e| {
            log::error!("`task::{name}` stopped: {e}");
            BoxError::from(Box::new(e))
        })));
    }
}

/// Flattens the result of a joined [`Task`].
fn joined(
    res: Result<Result<(), BoxError>, JoinError>,
) -> Result<(), BoxError> {
    res.map_err(|e| BoxError::from(Box::new(e)))?
}

impl IntoFuture for Background {
    type Output = Result<(), BoxError>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, handles } = self;
        let tasks = handles.into_iter().map(|h| h.map(joined).boxed_local());
        future::try_join_all(iter::once(set.map(Ok).boxed_local()).chain(tasks))
            .map_ok(drop)
            .boxed_local()
    }
}
