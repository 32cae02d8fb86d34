//! Application settings and configuration
//!
//! Settings are read from environment variables (and a `.env` file when
//! present) into a typed struct with defaults, then validated.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

use crate::services::key_generator::MIN_KEY_BYTES;

/// Application environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    #[value(alias = "dev")]
    Development,
    #[value(alias = "stage")]
    Staging,
    #[value(alias = "prod")]
    Production,
}

/// Which document store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    #[value(alias = "dynamo")]
    Dynamodb,
    #[value(alias = "mem")]
    Memory,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    #[value(alias = "text")]
    Pretty,
}

/// Display as the CLI value name, e.g. `production` or `memory`
macro_rules! display_as_value_name {
    ($($ty:ty),+) => {$(
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                match self.to_possible_value() {
                    Some(value) => f.write_str(value.get_name()),
                    None => Ok(()),
                }
            }
        }
    )+};
}

display_as_value_name!(Environment, StoreBackend, LogFormat);

/// Main application settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    // App settings
    pub app_name: String,
    pub app_version: String,
    pub environment: Environment,
    pub log_level: String,
    pub log_format: LogFormat,

    // Server settings
    pub host: String,
    pub port: u16,

    // Storage
    pub store_backend: StoreBackend,
    pub aws_region: String,
    pub dynamodb_endpoint_url: Option<String>,
    pub dynamodb_quotes_table: String,
    pub dynamodb_quote_texts_table: String,
    pub dynamodb_api_keys_table: String,
    pub dynamodb_usage_table: String,

    // Keys
    /// Random bytes per issued API key (hex encoded, so keys are twice as long)
    pub api_key_bytes: usize,
}

const DEFAULT_TABLE_PREFIX: &str = "quotes-api";

impl Settings {
    /// Load settings from environment variables with defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let prefix = env_or_default("DYNAMODB_TABLE_PREFIX", DEFAULT_TABLE_PREFIX);
        let table = |var: &str, suffix: &str| {
            env::var(var).unwrap_or_else(|_| table_name(&prefix, suffix))
        };

        let settings = Self {
            app_name: env_or_default("APP_NAME", "quotes-api"),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: env_enum("ENVIRONMENT", Environment::Development)?,
            log_level: env_or_default("LOG_LEVEL", "info"),
            log_format: env_enum("LOG_FORMAT", LogFormat::Json)?,

            host: env_or_default("HOST", "0.0.0.0"),
            port: env_or_default("PORT", "8000")
                .parse()
                .context("Invalid PORT value")?,

            store_backend: env_enum("STORE_BACKEND", StoreBackend::Dynamodb)?,
            aws_region: env_or_default("AWS_REGION", "us-east-1"),
            dynamodb_endpoint_url: env::var("DYNAMODB_ENDPOINT_URL").ok(),
            dynamodb_quotes_table: table("DYNAMODB_QUOTES_TABLE", "quotes"),
            dynamodb_quote_texts_table: table("DYNAMODB_QUOTE_TEXTS_TABLE", "quote-texts"),
            dynamodb_api_keys_table: table("DYNAMODB_API_KEYS_TABLE", "api-keys"),
            dynamodb_usage_table: table("DYNAMODB_USAGE_TABLE", "usage"),

            api_key_bytes: env_or_default("API_KEY_BYTES", &MIN_KEY_BYTES.to_string())
                .parse()
                .context("Invalid API_KEY_BYTES value")?,
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0");
        }

        if self.api_key_bytes < MIN_KEY_BYTES {
            anyhow::bail!("API_KEY_BYTES must be at least {}", MIN_KEY_BYTES);
        }

        let tables = [
            &self.dynamodb_quotes_table,
            &self.dynamodb_quote_texts_table,
            &self.dynamodb_api_keys_table,
            &self.dynamodb_usage_table,
        ];
        if tables.iter().any(|t| t.trim().is_empty()) {
            anyhow::bail!("DynamoDB table names cannot be empty");
        }

        if self.environment == Environment::Production && self.store_backend == StoreBackend::Memory
        {
            tracing::warn!("Running in production with the in-memory store, data will not persist");
        }

        Ok(())
    }

    /// Derive all four table names from `prefix`, replacing any per-table
    /// overrides
    pub fn apply_table_prefix(&mut self, prefix: &str) {
        self.dynamodb_quotes_table = table_name(prefix, "quotes");
        self.dynamodb_quote_texts_table = table_name(prefix, "quote-texts");
        self.dynamodb_api_keys_table = table_name(prefix, "api-keys");
        self.dynamodb_usage_table = table_name(prefix, "usage");
    }

    /// Get the server address string
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "quotes-api".to_string(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::Development,
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            host: "0.0.0.0".to_string(),
            port: 8000,
            store_backend: StoreBackend::Dynamodb,
            aws_region: "us-east-1".to_string(),
            dynamodb_endpoint_url: None,
            dynamodb_quotes_table: table_name(DEFAULT_TABLE_PREFIX, "quotes"),
            dynamodb_quote_texts_table: table_name(DEFAULT_TABLE_PREFIX, "quote-texts"),
            dynamodb_api_keys_table: table_name(DEFAULT_TABLE_PREFIX, "api-keys"),
            dynamodb_usage_table: table_name(DEFAULT_TABLE_PREFIX, "usage"),
            api_key_bytes: MIN_KEY_BYTES,
        }
    }
}

/// Helper function to get environment variable with default
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn table_name(prefix: &str, suffix: &str) -> String {
    format!("{}-{}", prefix, suffix)
}

/// Parse an enum-valued variable the same way the CLI parses its flags
fn env_enum<T: ValueEnum>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => T::from_str(raw.trim(), true)
            .map_err(|e| anyhow::anyhow!("Invalid {} value: {}", key, e)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.app_name, "quotes-api");
        assert_eq!(settings.port, 8000);
        assert_eq!(settings.store_backend, StoreBackend::Dynamodb);
        assert_eq!(settings.dynamodb_quote_texts_table, "quotes-api-quote-texts");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_enum_parsing_accepts_aliases() {
        assert_eq!(
            Environment::from_str("dev", true).unwrap(),
            Environment::Development
        );
        assert_eq!(
            Environment::from_str("Production", true).unwrap(),
            Environment::Production
        );
        assert!(Environment::from_str("qa", true).is_err());

        assert_eq!(StoreBackend::from_str("mem", true).unwrap(), StoreBackend::Memory);
        assert_eq!(
            StoreBackend::from_str("DynamoDB", true).unwrap(),
            StoreBackend::Dynamodb
        );
        assert_eq!(LogFormat::from_str("text", true).unwrap(), LogFormat::Pretty);
    }

    #[test]
    fn test_enum_display() {
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(StoreBackend::Memory.to_string(), "memory");
        assert_eq!(LogFormat::Json.to_string(), "json");
    }

    #[test]
    fn test_short_keys_rejected() {
        let settings = Settings {
            api_key_bytes: 8,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_apply_table_prefix() {
        let mut settings = Settings {
            dynamodb_usage_table: "custom-usage".to_string(),
            ..Settings::default()
        };
        settings.apply_table_prefix("staging");

        assert_eq!(settings.dynamodb_quotes_table, "staging-quotes");
        assert_eq!(settings.dynamodb_quote_texts_table, "staging-quote-texts");
        assert_eq!(settings.dynamodb_api_keys_table, "staging-api-keys");
        assert_eq!(settings.dynamodb_usage_table, "staging-usage");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_server_addr() {
        let settings = Settings {
            host: "127.0.0.1".to_string(),
            port: 3000,
            ..Settings::default()
        };
        assert_eq!(settings.server_addr(), "127.0.0.1:3000");
    }
}
