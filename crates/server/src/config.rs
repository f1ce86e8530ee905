//! Server configuration loaded from environment variables.
//!
//! The configuration is read once in `main` and handed to [`AppState`]; no
//! service reads the environment on its own.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TIDEWEAR_TOKEN_SECRET` - Session token signing secret (min 32 chars, high entropy)
//! - `TIDEWEAR_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`); only required when `TIDEWEAR_STORAGE=postgres`
//!
//! ## Optional
//! - `TIDEWEAR_STORAGE` - `postgres` (default) or `memory`
//! - `TIDEWEAR_HOST` - Bind address (default: 127.0.0.1)
//! - `TIDEWEAR_PORT` - Listen port (default: 5000)
//! - `TIDEWEAR_ALLOWED_ORIGINS` - Comma-separated CORS origins
//! - `TIDEWEAR_LOG_FORMAT` - `pretty` (default) or `json`
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! [`AppState`]: crate::state::AppState

use std::collections::HashMap;
use std::fmt::Display;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const STORAGE_VAR: &str = "TIDEWEAR_STORAGE";
const DATABASE_URL_VAR: &str = "TIDEWEAR_DATABASE_URL";
const HOST_VAR: &str = "TIDEWEAR_HOST";
const PORT_VAR: &str = "TIDEWEAR_PORT";
const ORIGINS_VAR: &str = "TIDEWEAR_ALLOWED_ORIGINS";
const TOKEN_SECRET_VAR: &str = "TIDEWEAR_TOKEN_SECRET";
const LOG_FORMAT_VAR: &str = "TIDEWEAR_LOG_FORMAT";

const MIN_TOKEN_SECRET_LENGTH: usize = 32;
const MIN_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that show up in copy-pasted sample secrets.
const PLACEHOLDER_HINTS: &[&str] = &[
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "xxx",
    "todo",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
    #[error("{var} is not safe to use: {reason}")]
    WeakSecret { var: &'static str, reason: String },
}

/// Where catalog, account and order data is kept.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// `PostgreSQL` via a connection pool.
    Postgres {
        /// Connection URL (contains password)
        database_url: SecretString,
    },
    /// Process-local maps; data is lost on restart.
    Memory,
}

/// Output format of the fmt tracing layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected 'pretty' or 'json', got '{other}'")),
        }
    }
}

/// Session token settings. `SecretString` keeps the secret out of `Debug`.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC signing secret
    pub secret: SecretString,
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub storage: StorageConfig,
    pub host: IpAddr,
    pub port: u16,
    /// Origins allowed to make cross-origin requests
    pub allowed_origins: Vec<Url>,
    pub token: TokenConfig,
    pub log_format: LogFormat,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from the environment, reading `.env` first if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing, a value does
    /// not parse, or the token secret is too weak to sign with.
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let storage = match var(STORAGE_VAR)
            .unwrap_or_else(|| "postgres".to_owned())
            .to_ascii_lowercase()
            .as_str()
        {
            "postgres" => StorageConfig::Postgres {
                database_url: var(DATABASE_URL_VAR)
                    .or_else(|| var("DATABASE_URL"))
                    .map(SecretString::from)
                    .ok_or(ConfigError::Missing(DATABASE_URL_VAR))?,
            },
            "memory" => StorageConfig::Memory,
            other => {
                return Err(ConfigError::Invalid {
                    var: STORAGE_VAR,
                    reason: format!("expected 'postgres' or 'memory', got '{other}'"),
                });
            }
        };

        let secret = var(TOKEN_SECRET_VAR).ok_or(ConfigError::Missing(TOKEN_SECRET_VAR))?;
        check_token_secret(&secret).map_err(|reason| ConfigError::WeakSecret {
            var: TOKEN_SECRET_VAR,
            reason,
        })?;

        Ok(Self {
            storage,
            host: parse_var(HOST_VAR, "127.0.0.1")?,
            port: parse_var(PORT_VAR, "5000")?,
            allowed_origins: parse_origins(var(ORIGINS_VAR).as_deref().unwrap_or_default())
                .map_err(|reason| ConfigError::Invalid {
                    var: ORIGINS_VAR,
                    reason,
                })?,
            token: TokenConfig {
                secret: SecretString::from(secret),
            },
            log_format: parse_var(LOG_FORMAT_VAR, "pretty")?,
            sentry_dsn: var("SENTRY_DSN"),
            sentry_environment: var("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration for in-process use (tests, demos): memory storage,
    /// loopback address, no CORS origins, no Sentry.
    #[must_use]
    pub fn in_memory(token_secret: impl Into<String>) -> Self {
        Self {
            storage: StorageConfig::Memory,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            allowed_origins: Vec::new(),
            token: TokenConfig {
                secret: SecretString::from(token_secret.into()),
            },
            log_format: LogFormat::Pretty,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// A trimmed, non-empty environment variable.
fn var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_var<T>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    var(key)
        .as_deref()
        .unwrap_or(default)
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            var: key,
            reason: e.to_string(),
        })
}

/// Parse a comma-separated list of origins, skipping blanks.
fn parse_origins(raw: &str) -> Result<Vec<Url>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let url = Url::parse(s).map_err(|e| format!("{s}: {e}"))?;
            if url.host_str().is_none() {
                return Err(format!("{s}: origin must have a host"));
            }
            Ok(url)
        })
        .collect()
}

/// Reject token secrets that are short, look copied from a sample, or have
/// too little variety to be random.
fn check_token_secret(secret: &str) -> Result<(), String> {
    let length = secret.chars().count();
    if length < MIN_TOKEN_SECRET_LENGTH {
        return Err(format!(
            "must be at least {MIN_TOKEN_SECRET_LENGTH} characters (got {length})"
        ));
    }

    let lower = secret.to_lowercase();
    if let Some(hint) = PLACEHOLDER_HINTS.iter().find(|hint| lower.contains(*hint)) {
        return Err(format!("looks like a placeholder (contains '{hint}')"));
    }

    let bits = bits_per_char(secret);
    if bits < MIN_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({bits:.2} bits/char, need {MIN_BITS_PER_CHAR:.1}); generate it randomly"
        ));
    }

    Ok(())
}

/// Shannon entropy of the character distribution.
fn bits_per_char(s: &str) -> f64 {
    let mut counts: HashMap<char, u32> = HashMap::new();
    for c in s.chars() {
        *counts.entry(c).or_default() += 1;
    }

    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = f64::from(total);
    counts
        .values()
        .map(|&n| {
            let p = f64::from(n) / total;
            -p * p.log2()
        })
        .sum()
}
