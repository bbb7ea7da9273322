//! Server configuration loaded from environment variables.
//!
//! All variables are optional:
//! - `HOSTER_HOST` - Bind address (default: 0.0.0.0)
//! - `HOSTER_PORT` - Listen port (default: 3000)
//! - `HOSTER_DATA_FILE` - JSON file backing the store (default: image_hoster.json)
//! - `HOSTER_SESSION_SECRET` - Session token signing secret (default: random per process)
//! - `HOSTER_SESSION_TTL_HOURS` - Session lifetime (default: 24)
//! - `HOSTER_BCRYPT_COST` - bcrypt work factor (default: bcrypt's default cost)
//! - `HOSTER_MAX_UPLOAD_BYTES` - Request body limit for uploads (default: 10 MiB)

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

use crate::storage::DEFAULT_STORAGE_FILE;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_SESSION_TTL_HOURS: i64 = 24;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub data_file: PathBuf,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub max_upload_bytes: usize,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_file", &self.data_file)
            .field("session_secret", &"[REDACTED]")
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            data_file: PathBuf::from(DEFAULT_STORAGE_FILE),
            session_secret: random_secret(),
            session_ttl_hours: DEFAULT_SESSION_TTL_HOURS,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let session_secret = match lookup("HOSTER_SESSION_SECRET") {
            Some(secret) if !secret.trim().is_empty() => secret,
            _ => {
                tracing::warn!(
                    "HOSTER_SESSION_SECRET is not set, sessions will not survive a restart"
                );
                defaults.session_secret
            }
        };

        let session_ttl_hours = parse_var(&lookup, "HOSTER_SESSION_TTL_HOURS", defaults.session_ttl_hours)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidEnvVar(
                "HOSTER_SESSION_TTL_HOURS".to_string(),
                "must be a positive number of hours".to_string(),
            ));
        }

        Ok(Self {
            host: parse_var(&lookup, "HOSTER_HOST", defaults.host)?,
            port: parse_var(&lookup, "HOSTER_PORT", defaults.port)?,
            data_file: lookup("HOSTER_DATA_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_file),
            session_secret,
            session_ttl_hours,
            bcrypt_cost: parse_var(&lookup, "HOSTER_BCRYPT_COST", defaults.bcrypt_cost)?,
            max_upload_bytes: parse_var(&lookup, "HOSTER_MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }

    #[must_use]
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn random_secret() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}
