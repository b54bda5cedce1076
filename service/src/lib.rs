//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{error::Error, sync::Arc};

use common::operations::{By, Start};
use derive_more::Debug;
use tokio::sync::RwLock;

#[cfg(doc)]
use infra::Database;

use self::domain::currency::Rates;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Currency [`Rates`] to use until the first successful refresh.
    pub fallback_rates: Rates,

    /// [`task::RefreshCurrencyRates`] configuration.
    pub refresh_currency_rates: task::refresh_currency_rates::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// Latest known snapshot of currency [`Rates`].
    rates: Arc<RwLock<Arc<Rates>>>,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::RefreshCurrencyRates<Self>,
                        task::refresh_currency_rates::Config,
                    >,
                >,
                Ok = (),
                Err: Error,
            > + Clone
            + 'static,
    {
        let rates = Arc::new(RwLock::new(Arc::new(
            config.fallback_rates.clone(),
        )));
        let this = Service {
            config,
            database,
            rates,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("RefreshCurrencyRates", async move {
            svc.execute(Start(By::new(svc.config().refresh_currency_rates)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns the latest known snapshot of currency [`Rates`].
    pub async fn rates(&self) -> Arc<Rates> {
        Arc::clone(&*self.rates.read().await)
    }

    /// Replaces the snapshot of currency [`Rates`] with the provided one.
    pub(crate) async fn replace_rates(&self, rates: Rates) {
        *self.rates.write().await = Arc::new(rates);
    }
}

#[cfg(test)]
impl<Db> Service<Db> {
    /// Creates a new [`Service`] over the provided `database` without
    /// spawning its background tasks.
    pub(crate) fn mock(database: Db) -> Self {
        use self::task::refresh_currency_rates;

        let secret = b"secret";
        let rates = Rates::new(common::Currency::USD, []);
        let config = Config {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(secret),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(secret),
            fallback_rates: rates.clone(),
            refresh_currency_rates: refresh_currency_rates::Config::default(),
        };
        Self {
            config,
            database,
            rates: Arc::new(RwLock::new(Arc::new(rates))),
        }
    }
}
