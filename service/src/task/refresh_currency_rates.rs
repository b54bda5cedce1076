//! [`RefreshCurrencyRates`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Select, Start};
use derive_more::{Display, Error as StdError, From};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::currency::{self, Rates},
    infra::{database, Database},
    Service,
};

use super::Task;

/// Configuration for [`RefreshCurrencyRates`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between polls of the latest [`Rates`].
    #[default(time::Duration::from_secs(30 * 60))]
    pub interval: time::Duration,
}

/// [`Task`] polling the latest [`Rates`] snapshot into the [`Service`].
///
/// A failed poll keeps the previously known [`Rates`] in use.
#[derive(Clone, Copy, Debug)]
pub struct RefreshCurrencyRates<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<RefreshCurrencyRates<Self>, Config>>> for Service<Db>
where
    RefreshCurrencyRates<Service<Db>>:
        Task<Perform<()>, Ok = (), Err: Error> + Send + Sync + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<RefreshCurrencyRates<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let task = RefreshCurrencyRates {
            config: by.into_inner(),
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::warn!(
                    "`task::RefreshCurrencyRates` failed, keeping previous \
                     rates: {e}",
                );
            });
        }
    }
}

impl<Db> Task<Perform<()>> for RefreshCurrencyRates<Service<Db>>
where
    Db: Database<
        Select<By<Option<Rates>, currency::Latest>>,
        Ok = Option<Rates>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let rates = self
            .service
            .database()
            .execute(Select(By::new(currency::Latest)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))?
            .ok_or(ExecutionError::NoRates)
            .map_err(tracerr::wrap!())?;

        log::debug!(
            "refreshed currency rates anchored at `{}`",
            rates.anchor(),
        );
        self.service.replace_rates(rates).await;
        Ok(())
    }
}

/// Error of [`RefreshCurrencyRates`] execution.
#[derive(Debug, Display, From, StdError)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// No [`Rates`] have been fed yet.
    #[display("No currency rates are available yet")]
    NoRates,
}

#[cfg(test)]
mod spec {
    use std::time;

    use super::Config;

    #[test]
    fn polls_every_half_an_hour_by_default() {
        assert_eq!(Config::default().interval, time::Duration::from_secs(1800));
    }
}
