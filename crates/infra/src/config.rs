//! Configuration loading and representation.
//!
//! Everything comes from environment variables; see [`AppConfig::from_env`].

use std::{env, fmt::Display, ops::RangeInclusive, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_JWT_SECRET: &str = "dev-secret";

const DB_MAX_CONNECTIONS: RangeInclusive<u32> = 1..=u32::MAX;
/// At most one year.
const JWT_TTL_HOURS: RangeInclusive<i64> = 1..=24 * 365;
const BCRYPT_COST: RangeInclusive<u32> = 4..=31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub imgbb_key: Option<String>,
    /// Seconds after which imgbb deletes uploads.
    pub imgbb_expiration: Option<u32>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable source (tests use a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set; using insecure dev default");
            DEFAULT_JWT_SECRET.to_string()
        });

        let database_url = var("DATABASE_URL").or_else(|| {
            let host = var("DB_HOST")?;
            let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());
            let user = var("DB_USER").unwrap_or_default();
            let password = var("DB_PASSWORD").unwrap_or_default();
            let name = var("DB_NAME").unwrap_or_default();
            Some(format!(
                "postgres://{user}:{password}@{host}:{port}/{name}?sslmode=disable"
            ))
        });
        if database_url.is_none() {
            warn!("neither DATABASE_URL nor DB_HOST set; data will only live in memory");
        }

        let imgbb_key = var("IMGBB_KEY");
        if imgbb_key.is_none() {
            warn!("IMGBB_KEY not set; image uploads will fail");
        }

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            database_url,
            db_max_connections: parse_within(&var, "DB_MAX_CONNECTIONS", 10, DB_MAX_CONNECTIONS)?,
            jwt_secret,
            jwt_ttl_hours: parse_within(&var, "JWT_TTL_HOURS", 24, JWT_TTL_HOURS)?,
            bcrypt_cost: parse_within(&var, "BCRYPT_COST", 14, BCRYPT_COST)?,
            imgbb_key,
            imgbb_expiration: var("IMGBB_EXPIRATION")
                .map(|v| parse("IMGBB_EXPIRATION", v))
                .transpose()?,
        })
    }
}

fn parse<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}

fn parse_or<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display,
    T::Err: Display,
{
    match var(key) {
        Some(value) => parse(key, value),
        None => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

fn parse_within<T, F>(
    var: &F,
    key: &'static str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Display + PartialOrd,
    T::Err: Display,
{
    let value = parse_or(var, key, default)?;
    if !range.contains(&value) {
        return Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
            reason: format!("must be between {} and {}", range.start(), range.end()),
        });
    }
    Ok(value)
}
