//! Configuration file parser for ~/.config/curio/config.toml.
//!
//! The file is optional. Any subset of keys may be given; the rest keep
//! their defaults. Keys the resolver does not know are reported by
//! [`Config::parse`] and logged by [`Config::load`].
use crate::feed::{redirect_policy, ResolverOptions, DEFAULT_MAX_BODY_BYTES};
use serde::Deserialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Resolver configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Request timeout in seconds. 0 = no resolver-level timeout.
    pub timeout_secs: u64,

    /// Maximum response body size in bytes.
    pub max_body_bytes: usize,

    /// `User-Agent` header sent with feed requests.
    pub user_agent: String,

    /// Reject localhost and private IP literals before connecting.
    pub block_private_hosts: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            user_agent: concat!("curio-feed/", env!("CARGO_PKG_VERSION")).to_string(),
            block_private_hosts: false,
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 4] = [
        "timeout_secs",
        "max_body_bytes",
        "user_agent",
        "block_private_hosts",
    ];

    /// Load configuration from a TOML file.
    ///
    /// A missing or blank file yields the defaults. Unknown keys are logged
    /// and otherwise ignored.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let Some(content) = read_capped(path, Self::MAX_FILE_SIZE)? else {
            tracing::debug!(path = %path.display(), "No config file found, using defaults");
            return Ok(Self::default());
        };

        let (config, unknown_keys) = Self::parse(&content)?;
        if !unknown_keys.is_empty() {
            tracing::warn!(
                path = %path.display(),
                keys = ?unknown_keys,
                "Unknown keys in config file, ignoring"
            );
        }
        tracing::info!(
            path = %path.display(),
            timeout_secs = config.timeout_secs,
            block_private_hosts = config.block_private_hosts,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parses TOML text, returning the config and any keys it does not know.
    ///
    /// Blank input parses to the defaults.
    pub fn parse(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        if content.trim().is_empty() {
            return Ok((Self::default(), Vec::new()));
        }

        let table: toml::Table = content.parse()?;
        let unknown_keys = table
            .keys()
            .filter(|key| !Self::KNOWN_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();
        let config = toml::Value::Table(table).try_into()?;
        Ok((config, unknown_keys))
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            timeout: self.timeout(),
            max_body_bytes: self.max_body_bytes,
            block_private_hosts: self.block_private_hosts,
        }
    }

    /// Builds the HTTP client used for feed requests.
    ///
    /// Redirect hops are held to the same host policy as `options`.
    pub fn build_client(&self, options: &ResolverOptions) -> reqwest::Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.as_str())
            .redirect(redirect_policy(options.block_private_hosts))
            .build()
    }
}

/// Reads at most `limit` bytes of `path`. `Ok(None)` when the file is absent.
fn read_capped(path: &Path, limit: u64) -> Result<Option<String>, ConfigError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut bytes = Vec::new();
    file.take(limit + 1).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Err(ConfigError::TooLarge(format!("exceeds {limit} bytes")));
    }

    String::from_utf8(bytes)
        .map(Some)
        .map_err(|e| ConfigError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

// ============================================================================
// Tests
// ============================================================================
