//! Configuration for the Taskboard service.
//!
//! Everything comes from the process environment; the binary loads a `.env`
//! file first when one is present.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use tasks::DeepSeekConfig;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be set")]
    Missing { var: &'static str },

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected text or json)")),
        }
    }
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC secret
    pub secret: String,
    pub algorithm: Algorithm,
    /// Token lifetime in minutes.
    pub expire_minutes: i64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &"<redacted>")
            .field("algorithm", &self.algorithm)
            .field("expire_minutes", &self.expire_minutes)
            .finish()
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// PostgreSQL URL; `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// Pool size for PostgreSQL.
    pub database_max_connections: u32,
    pub jwt: JwtConfig,
    /// bcrypt work factor.
    pub bcrypt_cost: u32,
    /// Chat-completion endpoint settings.
    pub chat: DeepSeekConfig,
    pub log_format: LogFormat,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_EXPIRE_MINUTES: i64 = 60;
/// One year.
const MAX_EXPIRE_MINUTES: i64 = 366 * 24 * 60;
const MAX_CHAT_TIMEOUT_SECS: u64 = 3600;

/// Read a variable, treating empty values as unset.
fn var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}

fn parse_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match var(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var: name,
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

fn parse_algorithm(value: &str) -> Result<Algorithm, ConfigError> {
    match value.trim().to_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        _ => Err(ConfigError::Invalid {
            var: "JWT_ALGORITHM",
            value: value.to_string(),
            reason: "only HS256, HS384 and HS512 are supported".to_string(),
        }),
    }
}

impl Config {
    /// Defaults with the given signing secret, ignoring the environment.
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            database_url: None,
            database_max_connections: DEFAULT_MAX_CONNECTIONS,
            jwt: JwtConfig {
                secret: jwt_secret.into(),
                algorithm: Algorithm::HS256,
                expire_minutes: DEFAULT_EXPIRE_MINUTES,
            },
            bcrypt_cost: bcrypt::DEFAULT_COST,
            chat: DeepSeekConfig::default(),
            log_format: LogFormat::Text,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let secret = var("JWT_SECRET").ok_or(ConfigError::Missing { var: "JWT_SECRET" })?;
        let mut config = Self::new(secret);

        if let Some(host) = var("APP_HOST") {
            config.host = host;
        }
        config.port = parse_var("APP_PORT", DEFAULT_PORT)?;
        config.database_url = var("DATABASE_URL");
        config.database_max_connections =
            parse_var("DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;

        if let Some(algorithm) = var("JWT_ALGORITHM") {
            config.jwt.algorithm = parse_algorithm(&algorithm)?;
        }
        config.jwt.expire_minutes = parse_var("JWT_EXPIRE_MINUTES", DEFAULT_EXPIRE_MINUTES)?;
        if !(1..=MAX_EXPIRE_MINUTES).contains(&config.jwt.expire_minutes) {
            return Err(ConfigError::Invalid {
                var: "JWT_EXPIRE_MINUTES",
                value: config.jwt.expire_minutes.to_string(),
                reason: format!("must be between 1 and {MAX_EXPIRE_MINUTES}"),
            });
        }

        config.bcrypt_cost = parse_var("BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: config.bcrypt_cost.to_string(),
                reason: "must be between 4 and 31".to_string(),
            });
        }

        config.chat.api_key = var("DEEPSEEK_API_KEY");
        if let Some(url) = var("DEEPSEEK_API_URL") {
            config.chat.api_url = url;
        }
        if let Some(model) = var("DEEPSEEK_MODEL") {
            config.chat.model = model;
        }
        let timeout_secs: u64 = parse_var("CHAT_TIMEOUT_SECS", config.chat.timeout.as_secs())?;
        if !(1..=MAX_CHAT_TIMEOUT_SECS).contains(&timeout_secs) {
            return Err(ConfigError::Invalid {
                var: "CHAT_TIMEOUT_SECS",
                value: timeout_secs.to_string(),
                reason: format!("must be between 1 and {MAX_CHAT_TIMEOUT_SECS}"),
            });
        }
        config.chat.timeout = Duration::from_secs(timeout_secs);

        config.log_format = parse_var("LOG_FORMAT", LogFormat::Text)?;

        Ok(config)
    }

    /// `host:port` for the listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
