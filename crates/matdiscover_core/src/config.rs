//! Runtime configuration.
//!
//! # Responsibility
//! - Resolve store, allowlist and catalog locations plus query policy from
//!   environment variables.
//! - Validate values once, before any store is opened.
//!
//! # Invariants
//! - Unset variables fall back to documented defaults.
//! - Set-but-invalid variables are errors, never silently defaulted.

use crate::index::CachePolicy;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB: &str = "MATDISCOVER_DB";
pub const ENV_ALLOWLIST: &str = "MATDISCOVER_ALLOWLIST";
pub const ENV_QUANTITIES: &str = "MATDISCOVER_QUANTITIES";
pub const ENV_EXPLORE_URL: &str = "EXPLORE_URL";
pub const ENV_GROUP_PREFIX: &str = "MATDISCOVER_GROUP_PREFIX";
pub const ENV_QUERY_TIMEOUT_MS: &str = "MATDISCOVER_QUERY_TIMEOUT_MS";
pub const ENV_CACHE_POLICY: &str = "MATDISCOVER_CACHE_POLICY";

pub const DEFAULT_DB_PATH: &str = "matdiscover.sqlite3";
pub const DEFAULT_ALLOWLIST_PATH: &str = "static/materials-info.csv";
pub const DEFAULT_EXPLORE_URL: &str = "https://dev-www.materialscloud.org/explore/curated-cofs";
pub const DEFAULT_GROUP_PREFIX: &str = "curated-mof";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidValue {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { key, value, reason } => {
                write!(f, "invalid value `{value}` for {key}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoverConfig {
    pub db_path: PathBuf,
    pub allowlist_path: PathBuf,
    /// Quantity declarations file; builtin declarations when `None`.
    pub quantities_path: Option<PathBuf>,
    /// Base URL of the provenance explorer used for node links.
    pub explore_url: String,
    /// Group label prefix of curated material groups.
    pub group_prefix: String,
    pub query_timeout: Duration,
    pub cache_policy: CachePolicy,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            allowlist_path: PathBuf::from(DEFAULT_ALLOWLIST_PATH),
            quantities_path: None,
            explore_url: DEFAULT_EXPLORE_URL.to_string(),
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            cache_policy: CachePolicy::TrackRevision,
        }
    }
}

impl DiscoverConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(value) = read(ENV_DB) {
            config.db_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_ALLOWLIST) {
            config.allowlist_path = PathBuf::from(value);
        }
        if let Some(value) = read(ENV_QUANTITIES) {
            config.quantities_path = Some(PathBuf::from(value));
        }
        if let Some(value) = read(ENV_EXPLORE_URL) {
            config.explore_url = parse_explore_url(value)?;
        }
        if let Some(value) = lookup(ENV_GROUP_PREFIX) {
            config.group_prefix = parse_group_prefix(value)?;
        }
        if let Some(value) = read(ENV_QUERY_TIMEOUT_MS) {
            config.query_timeout = parse_timeout(value)?;
        }
        if let Some(value) = read(ENV_CACHE_POLICY) {
            config.cache_policy = parse_cache_policy(value)?;
        }

        Ok(config)
    }
}

fn parse_explore_url(value: String) -> Result<String, ConfigError> {
    if !value.starts_with("http://") && !value.starts_with("https://") {
        return Err(ConfigError::InvalidValue {
            key: ENV_EXPLORE_URL,
            value,
            reason: "expected an http(s) URL",
        });
    }
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_group_prefix(value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed.contains(['%', '\\']) {
        return Err(ConfigError::InvalidValue {
            key: ENV_GROUP_PREFIX,
            value,
            reason: "expected a non-empty literal group prefix",
        });
    }
    Ok(trimmed.to_string())
}

fn parse_timeout(value: String) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(0) | Err(_) => Err(ConfigError::InvalidValue {
            key: ENV_QUERY_TIMEOUT_MS,
            value,
            reason: "expected a positive number of milliseconds",
        }),
        Ok(millis) => Ok(Duration::from_millis(millis)),
    }
}

fn parse_cache_policy(value: String) -> Result<CachePolicy, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "track_revision" => Ok(CachePolicy::TrackRevision),
        "pinned" => Ok(CachePolicy::Pinned),
        _ => Err(ConfigError::InvalidValue {
            key: ENV_CACHE_POLICY,
            value,
            reason: "expected track_revision|pinned",
        }),
    }
}
