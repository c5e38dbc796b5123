//! Engine configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use comanda_core::invoice::{InvoiceLayout, MIN_INVOICE_WIDTH};
use comanda_db::DbConfig;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable, multi-line.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl FromStr for LogFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(()),
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Pool acquire timeout in seconds
    pub db_connect_timeout_secs: u64,

    /// Default tracing filter; `RUST_LOG` wins when set
    pub log_filter: String,

    /// Log output format
    pub log_format: LogFormat,

    /// Invoice columns
    pub invoice_width: usize,

    /// Invoice time zone, minutes east of UTC
    pub invoice_utc_offset_minutes: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            database_path: PathBuf::from("./comanda.db"),
            db_max_connections: 5,
            db_connect_timeout_secs: 30,
            log_filter: "info".to_string(),
            log_format: LogFormat::Pretty,
            invoice_width: 48,
            invoice_utc_offset_minutes: 0,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn load_from(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = EngineConfig::default();

        let config = EngineConfig {
            database_path: lookup("COMANDA_DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_var(
                &lookup,
                "COMANDA_DB_MAX_CONNECTIONS",
                defaults.db_max_connections,
            )?,

            db_connect_timeout_secs: parse_var(
                &lookup,
                "COMANDA_DB_CONNECT_TIMEOUT_SECS",
                defaults.db_connect_timeout_secs,
            )?,

            log_filter: lookup("COMANDA_LOG").unwrap_or(defaults.log_filter),

            log_format: parse_var(&lookup, "COMANDA_LOG_FORMAT", defaults.log_format)?,

            invoice_width: parse_var(&lookup, "COMANDA_INVOICE_WIDTH", defaults.invoice_width)?,

            invoice_utc_offset_minutes: parse_var(
                &lookup,
                "COMANDA_INVOICE_UTC_OFFSET_MINUTES",
                defaults.invoice_utc_offset_minutes,
            )?,
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "COMANDA_DB_MAX_CONNECTIONS".to_string(),
            ));
        }

        if config.invoice_width < MIN_INVOICE_WIDTH {
            return Err(ConfigError::InvalidValue("COMANDA_INVOICE_WIDTH".to_string()));
        }

        // FixedOffset accepts strictly less than a day either way.
        if config.invoice_utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            return Err(ConfigError::InvalidValue(
                "COMANDA_INVOICE_UTC_OFFSET_MINUTES".to_string(),
            ));
        }

        Ok(config)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.db_max_connections)
            .connect_timeout(Duration::from_secs(self.db_connect_timeout_secs))
    }

    /// Invoice layout derived from this configuration.
    pub fn invoice_layout(&self) -> InvoiceLayout {
        InvoiceLayout::new(self.invoice_width, self.invoice_utc_offset_minutes)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(name.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
