// src/config.rs

//! Layered configuration.
//!
//! Merge order (later overrides earlier): compiled defaults, `./bijou.toml`,
//! the bare deployment variables (`DATABASE_URL`, `TWILIO_*`) and finally
//! `BIJOU_*` variables.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, EnvFilter};

use crate::sales::sale_recorder::StockPolicy;

/// Top level configuration for the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub sms: SmsConfig,
    pub sales: SalesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// Apply the embedded migrations at startup.
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/bijou".into(),
            max_connections: 5,
            run_migrations: true,
        }
    }
}

/// JWT settings. Also registered as app data so the auth extractor can read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: 12,
        }
    }
}

/// Twilio settings. Every field is optional; alerts are skipped unless all are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SmsConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    pub from_number: Option<String>,
    pub api_base: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            from_number: None,
            api_base: "https://api.twilio.com".into(),
        }
    }
}

/// Resolved Twilio credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    pub api_base: String,
}

impl SmsConfig {
    /// Returns credentials only when the provider is fully configured.
    ///
    /// Twilio account SIDs always start with `AC`; anything else is treated as
    /// a placeholder and disables SMS.
    pub fn credentials(&self) -> Option<SmsCredentials> {
        let account_sid = self.account_sid.as_deref().filter(|s| s.starts_with("AC"))?;
        let auth_token = self.auth_token.as_deref().filter(|s| !s.is_empty())?;
        let from_number = self.from_number.as_deref().filter(|s| !s.is_empty())?;
        Some(SmsCredentials {
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
            api_base: self.api_base.clone(),
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SalesConfig {
    pub stock_policy: StockPolicy,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

impl LoggingConfig {
    /// Initialize the tracing subscriber. `RUST_LOG` wins over the configured level.
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

/// Configuration errors surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        ConfigError::Load(Box::new(e))
    }
}

/// Longest accepted token lifetime, one year.
pub const MAX_TOKEN_TTL_HOURS: i64 = 24 * 365;

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "auth.jwt_secret",
                reason: "must be set (BIJOU_AUTH_JWT_SECRET)".into(),
            });
        }
        if !(1..=MAX_TOKEN_TTL_HOURS).contains(&self.auth.token_ttl_hours) {
            return Err(ConfigError::InvalidValue {
                field: "auth.token_ttl_hours",
                reason: format!("must be between 1 and {MAX_TOKEN_TTL_HOURS}"),
            });
        }
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "database.max_connections",
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}

/// Load configuration from `./bijou.toml` and the environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_from(Figment::new().merge(Toml::file("bijou.toml")))
}

/// Load configuration from a TOML string only. Environment is ignored.
#[cfg(test)]
pub fn load_config_from_str(toml_content: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()?;
    config.validate()?;
    Ok(config)
}

fn load_from(files: Figment) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = Figment::new()
        .merge(Serialized::defaults(AppConfig::default()))
        .merge(files)
        .merge(legacy_env_provider())
        .merge(twilio_env_provider())
        .merge(env_provider())
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// `BIJOU_<SECTION>_<KEY>`. Only the first underscore separates the section,
/// so keys like `jwt_secret` or `auth_token` stay intact.
fn env_provider() -> Env {
    Env::prefixed("BIJOU_").map(|key| match key.as_str().split_once('_') {
        Some((section, field)) => format!("{section}.{field}").into(),
        None => key.into(),
    })
}

fn legacy_env_provider() -> Env {
    Env::raw()
        .only(&["DATABASE_URL"])
        .map(|_| "database.url".into())
}

fn twilio_env_provider() -> Env {
    Env::prefixed("TWILIO_")
        .only(&["account_sid", "auth_token", "phone_number"])
        .map(|key| match key.as_str() {
            "phone_number" => "sms.from_number".into(),
            other => format!("sms.{other}").into(),
        })
}
