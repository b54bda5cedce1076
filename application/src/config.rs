//! [`Config`]-related definitions.

use std::{collections::HashMap, time};

use common::Currency;
use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use rust_decimal::Decimal;
use serde::Deserialize;
use service::domain::currency::Rates;
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default("secret".to_owned())]
    pub jwt_secret: String,

    /// Currency rates to use until the provider is reached.
    pub fallback_rates: FallbackRates,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            fallback_rates: FallbackRates { anchor, rates },
            tasks: Tasks {
                refresh_currency_rates,
            },
        } = value;
        Self {
            jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                jwt_secret.as_bytes(),
            ),
            fallback_rates: Rates::new(anchor, rates),
            refresh_currency_rates:
                service::task::refresh_currency_rates::Config {
                    interval: refresh_currency_rates.interval,
                },
        }
    }
}

/// Fallback currency rates configuration.
///
/// Currencies missing here are converted with the rate of `1`.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct FallbackRates {
    /// Currency the rates are relative to.
    #[default(Currency::USD)]
    pub anchor: Currency,

    /// Units of each currency one unit of the `anchor` buys.
    pub rates: HashMap<Currency, Decimal>,
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `RefreshCurrencyRates` task configuration.
    pub refresh_currency_rates: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(60 * 30))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("sales".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("sales".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("sales".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time;

    use common::Currency;
    use config::{builder::DefaultState, ConfigBuilder, File, FileFormat};
    use rust_decimal::Decimal;

    use super::Config;

    fn parse(toml: &str) -> Config {
        ConfigBuilder::<DefaultState>::default()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn falls_back_to_defaults() {
        let config = parse("");

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.service.fallback_rates.anchor, Currency::USD);
        assert!(config.service.fallback_rates.rates.is_empty());
        assert_eq!(
            config.service.tasks.refresh_currency_rates.interval,
            time::Duration::from_secs(30 * 60),
        );
    }

    #[test]
    fn reads_fallback_rates() {
        let config = parse(
            r#"
            [service.fallback_rates]
            anchor = "usd"

            [service.fallback_rates.rates]
            EUR = "0.92"
            PKR = "278.5"

            [service.tasks.refresh_currency_rates]
            interval = "10m"
            "#,
        );
        let rates = &config.service.fallback_rates.rates;

        assert_eq!(config.service.fallback_rates.anchor, Currency::USD);
        assert_eq!(
            rates[&Currency::new("EUR").unwrap()],
            Decimal::new(92, 2),
        );
        assert_eq!(
            rates[&Currency::new("pkr").unwrap()],
            Decimal::new(2785, 1),
        );
        assert_eq!(
            config.service.tasks.refresh_currency_rates.interval,
            time::Duration::from_secs(10 * 60),
        );
    }
}
