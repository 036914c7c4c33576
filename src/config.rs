//! Configuration file handling.
//!
//! This module provides loading and saving of lockscan configuration
//! from a TOML file, and builds the [`ThreatListConfig`] handed to the
//! threat list cache.
//!
//! # Configuration Location
//!
//! The configuration file is stored at:
//! - Linux: `~/.config/lockscan/config.toml`
//! - macOS: `~/Library/Application Support/lockscan/config.toml`
//! - Windows: `%APPDATA%\lockscan\config.toml`
//!
//! # Example Configuration
//!
//! ```toml
//! cache_ttl_hours = 24
//! threat_list_url = "https://raw.githubusercontent.com/Cobenian/shai-hulud-detect/main/compromised-packages.txt"
//! fetch_timeout_secs = 30
//! min_expected_packages = 500
//! playbook_url = "https://github.com/Cobenian/shai-hulud-detect"
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScanError;
use crate::platform;

pub const DEFAULT_THREAT_LIST_URL: &str =
    "https://raw.githubusercontent.com/Cobenian/shai-hulud-detect/main/compromised-packages.txt";

pub const DEFAULT_PLAYBOOK_URL: &str = "https://github.com/Cobenian/shai-hulud-detect";

/// Marker the threat list must carry to be accepted.
pub const EXPECTED_HEADER: &str = "Shai-Hulud NPM Supply Chain Attack";

/// Fewer entries than this means the download was truncated.
pub const MIN_EXPECTED_PACKAGES: usize = 500;

pub const CACHE_FILE_NAME: &str = "compromised-packages.txt";

/// Application configuration.
///
/// This struct represents all configurable options for lockscan.
/// It can be loaded from a TOML file or created with default values.
///
/// # Example
///
/// ```no_run
/// use lockscan::Config;
///
/// // Load from file (or use defaults if file doesn't exist)
/// let config = Config::load().unwrap();
///
/// println!("Cache TTL: {} hours", config.cache_ttl_hours);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// How long a downloaded threat list stays fresh, in hours.
    ///
    /// Default: 24 hours
    pub cache_ttl_hours: u64,

    /// Where the compromised package list is downloaded from. Must be HTTPS.
    pub threat_list_url: String,

    /// Connect and read timeout for the download, in seconds.
    ///
    /// Default: 30 seconds
    pub fetch_timeout_secs: u64,

    /// Minimum number of entries a downloaded list must have.
    ///
    /// Default: 500
    pub min_expected_packages: usize,

    /// Incident response link shown when a scan is not clean.
    pub playbook_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_hours: 24,
            threat_list_url: DEFAULT_THREAT_LIST_URL.to_string(),
            fetch_timeout_secs: 30,
            min_expected_packages: MIN_EXPECTED_PACKAGES,
            playbook_url: DEFAULT_PLAYBOOK_URL.to_string(),
        }
    }
}

/// Everything the threat list cache needs, passed in at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreatListConfig {
    pub cache_dir: PathBuf,
    pub ttl: Duration,
    pub url: String,
    pub timeout: Duration,
    pub min_expected_packages: usize,
    pub expected_header: String,
}

impl ThreatListConfig {
    /// Defaults rooted at `cache_dir`. Handy for tests with a temp directory.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Config::default().threat_list_config_in(cache_dir.into())
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE_NAME)
    }
}

impl Config {
    /// Loads configuration from the config file.
    ///
    /// If the config file doesn't exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be read or parsed.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to the config file.
    ///
    /// Creates the parent directory if it doesn't exist.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();

        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        platform::config_path()
    }

    /// Generates a string containing the default configuration.
    pub fn generate_default_config() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }

    /// Rejects settings that would weaken the download checks.
    pub fn validate(&self) -> Result<(), ScanError> {
        if !self.threat_list_url.starts_with("https://") {
            return Err(ScanError::Config(format!(
                "threat_list_url must use https: {}",
                self.threat_list_url
            )));
        }
        if self.min_expected_packages == 0 {
            return Err(ScanError::Config(
                "min_expected_packages must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Builds the cache configuration using the XDG cache directory.
    pub fn threat_list_config(&self) -> ThreatListConfig {
        self.threat_list_config_in(platform::cache_dir())
    }

    fn threat_list_config_in(&self, cache_dir: PathBuf) -> ThreatListConfig {
        ThreatListConfig {
            cache_dir,
            ttl: Duration::from_secs(self.cache_ttl_hours * 3600),
            url: self.threat_list_url.clone(),
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            min_expected_packages: self.min_expected_packages,
            expected_header: EXPECTED_HEADER.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.cache_ttl_hours, 24);
        assert_eq!(config.fetch_timeout_secs, 30);
        assert_eq!(config.min_expected_packages, 500);
        assert!(config.threat_list_url.starts_with("https://"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str("cache_ttl_hours = 6").unwrap();
        assert_eq!(config.cache_ttl_hours, 6);
        assert_eq!(config.threat_list_url, DEFAULT_THREAT_LIST_URL);
    }

    #[test]
    fn test_validate_rejects_plain_http() {
        let config = Config {
            threat_list_url: "http://example.com/list.txt".to_string(),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ScanError::Config(_))));
    }

    #[test]
    fn test_threat_list_config() {
        let cfg = ThreatListConfig::with_cache_dir("/tmp/cache-test");
        assert_eq!(cfg.ttl, Duration::from_secs(24 * 3600));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.expected_header, EXPECTED_HEADER);
        assert_eq!(
            cfg.cache_file(),
            PathBuf::from("/tmp/cache-test/compromised-packages.txt")
        );
    }
}
