//! Application configuration.

use chrono::Duration;
use motors_core::auth::jwt::{DEFAULT_LEEWAY_SECS, DEFAULT_TOKEN_TTL};
use motors_core::auth::parse_ttl;
use thiserror::Error;

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid token lifetime `{0}` (expected e.g. 1h, 30m, 3600)")]
    InvalidTtl(String),

    #[error("invalid value `{value}` for {var}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Token and cookie settings.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HMAC secret for identity tokens. `None` disables signing.
    pub jwt_secret: Option<String>,
    /// Token lifetime; also the `jwt` cookie max-age.
    pub token_ttl: Duration,
    /// Clock skew tolerated when checking `exp`.
    pub leeway_secs: u64,
    /// Mark auth and session cookies `Secure`.
    pub secure_cookies: bool,
}

impl AuthConfig {
    /// Development defaults with the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: Some(secret.into()),
            ..Self::default()
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            token_ttl: Duration::hours(1),
            leeway_secs: DEFAULT_LEEWAY_SECS,
            secure_cookies: false,
        }
    }
}

/// Configuration for the HTTP application.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:5500").
    pub bind_addr: String,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum pool connections.
    pub pool_max: u32,
    /// Production mode: secure cookies and HTTPS enforcement.
    pub production: bool,
    pub auth: AuthConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5500".into(),
            database_url: "postgres://localhost:5432/cse_motors".into(),
            pool_max: 10,
            production: false,
            auth: AuthConfig::default(),
        }
    }
}

fn env_nonempty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_number<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError> {
    match env_nonempty(var) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
    }
}

/// `production` (any case) in `APP_ENV` or `NODE_ENV`.
fn is_production_env() -> bool {
    ["APP_ENV", "NODE_ENV"]
        .into_iter()
        .filter_map(env_nonempty)
        .any(|v| v.eq_ignore_ascii_case("production"))
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable                            | Default                                  |
    /// |-------------------------------------|------------------------------------------|
    /// | `BIND_ADDR`                         | `127.0.0.1:5500`                         |
    /// | `DATABASE_URL`                      | `postgres://localhost:5432/cse_motors`   |
    /// | `PGPOOL_MAX`                        | `10`                                     |
    /// | `ACCESS_TOKEN_SECRET` / `JWT_SECRET`| unset (signing disabled)                 |
    /// | `TOKEN_TTL`                         | `1h`                                     |
    /// | `TOKEN_LEEWAY_SECS`                 | `5`                                      |
    /// | `APP_ENV` / `NODE_ENV`              | not `production`                         |
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let production = is_production_env();

        let ttl_raw = env_nonempty("TOKEN_TTL").unwrap_or_else(|| DEFAULT_TOKEN_TTL.into());
        let token_ttl = parse_ttl(&ttl_raw).map_err(|_| ConfigError::InvalidTtl(ttl_raw))?;

        Ok(Self {
            bind_addr: env_nonempty("BIND_ADDR").unwrap_or(defaults.bind_addr),
            database_url: env_nonempty("DATABASE_URL").unwrap_or(defaults.database_url),
            pool_max: env_number("PGPOOL_MAX", defaults.pool_max)?,
            production,
            auth: AuthConfig {
                jwt_secret: env_nonempty("ACCESS_TOKEN_SECRET").or_else(|| env_nonempty("JWT_SECRET")),
                token_ttl,
                leeway_secs: env_number("TOKEN_LEEWAY_SECS", DEFAULT_LEEWAY_SECS)?,
                secure_cookies: production,
            },
        })
    }
}
