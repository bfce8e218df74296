//! Environment-sourced configuration.
//!
//! Everything handspread needs from the environment is read once, eagerly
//! validated, and carried in a plain [`Config`]. A `.env` file is honored
//! when present.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

use crate::core::market::{FinnhubTransport, MarketClient};
use crate::error::{ConfigError, Result};

const DEFAULT_MARKET_TTL_SECONDS: u64 = 300;
const DEFAULT_MARKET_CONCURRENCY: usize = 8;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Market vendor credential.
    pub finnhub_api_key: String,
    /// User agent for SEC requests, passed through to the XBRL library.
    pub sec_user_agent: String,
    /// Market snapshot cache TTL; zero disables reuse.
    pub market_ttl: Duration,
    /// Simultaneous vendor calls allowed.
    pub market_concurrency: usize,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the environment (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let config = Self {
            finnhub_api_key: required("FINNHUB_API_KEY")?,
            sec_user_agent: required("EDGARPACK_USER_AGENT")?,
            market_ttl: Duration::from_secs(parsed(
                "MARKET_TTL_SECONDS",
                DEFAULT_MARKET_TTL_SECONDS,
            )?),
            market_concurrency: parsed("MARKET_CONCURRENCY", DEFAULT_MARKET_CONCURRENCY as u64)?
                as usize,
            logging: LoggingConfig::default(),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.market_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MARKET_CONCURRENCY",
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Build a market client wired to Finnhub with this configuration.
    #[must_use]
    pub fn market_client(&self) -> MarketClient {
        MarketClient::new(
            Arc::new(FinnhubTransport::new(self.finnhub_api_key.clone())),
            self.market_ttl,
            self.market_concurrency,
        )
    }

    /// Initialize logging with the configured settings.
    pub fn init_logging(&self) {
        self.logging.init();
    }
}

fn required(field: &'static str) -> Result<String> {
    match env::var(field) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingField { field }.into()),
    }
}

fn parsed(field: &'static str, default: u64) -> Result<u64> {
    match env::var(field) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::InvalidValue {
                field,
                reason: format!("expected an integer, got {value:?}"),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl LoggingConfig {
    /// Initialize the tracing subscriber with this logging configuration.
    ///
    /// `RUST_LOG` takes precedence over the configured level.
    pub fn init(&self) {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.level));

        match self.format.as_str() {
            "json" => {
                fmt().json().with_env_filter(filter).init();
            }
            _ => {
                fmt().with_env_filter(filter).init();
            }
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}
