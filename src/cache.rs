//! Local cache of the compromised package list.
//!
//! The list is downloaded at most once per TTL and kept as a plain text file,
//! one `name:version` per line. A download is validated before it replaces
//! the file, so a bad response never overwrites a good cache.
//!
//! # Cache Location
//!
//! `$XDG_CACHE_HOME/lockscan/compromised-packages.txt`, falling back to
//! `~/.cache/lockscan/compromised-packages.txt`.
//!
//! # Example
//!
//! ```no_run
//! use lockscan::{cache::ThreatListCache, Config};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ThreatListCache::from_config(Config::default().threat_list_config())?;
//!     let threats = cache.compromised_packages(false).await?;
//!     println!("{} known compromised packages", threats.len());
//!     Ok(())
//! }
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;

use crate::config::ThreatListConfig;
use crate::error::ScanError;
use crate::model::ThreatList;
use crate::threat::{
    count_packages, default_source, validate_package_list, HttpThreatSource, ThreatListSource,
};

/// Cached, validated threat list backed by a [`ThreatListSource`].
pub struct ThreatListCache<S = HttpThreatSource> {
    config: ThreatListConfig,
    source: S,
}

impl ThreatListCache<HttpThreatSource> {
    /// Creates a cache that downloads from the configured URL.
    pub fn from_config(config: ThreatListConfig) -> Result<Self, ScanError> {
        let source = default_source(&config)?;
        Ok(Self::new(config, source))
    }
}

impl<S: ThreatListSource> ThreatListCache<S> {
    pub fn new(config: ThreatListConfig, source: S) -> Self {
        Self { config, source }
    }

    pub fn config(&self) -> &ThreatListConfig {
        &self.config
    }

    pub fn cache_file(&self) -> PathBuf {
        self.config.cache_file()
    }

    /// Ensures the cache directory exists.
    fn ensure_dir(&self) -> Result<(), ScanError> {
        if !self.config.cache_dir.exists() {
            fs::create_dir_all(&self.config.cache_dir)
                .map_err(|e| ScanError::io(&self.config.cache_dir, e))?;
        }
        Ok(())
    }

    /// True when the cache file is missing or older than the TTL.
    pub fn is_stale(&self) -> bool {
        let modified = match fs::metadata(self.cache_file()).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => return true,
        };

        match SystemTime::now().duration_since(modified) {
            Ok(elapsed) => elapsed >= self.config.ttl,
            // Modified in the future
            Err(_) => false,
        }
    }

    /// Returns the compromised package set, refreshing the cache first when
    /// it is stale or `refresh` is set.
    ///
    /// A failed refresh falls back to the existing cache with a warning.
    ///
    /// # Errors
    ///
    /// Fails when the refresh fails and there is no previous cache, or when
    /// the cache file cannot be read.
    pub async fn compromised_packages(&self, refresh: bool) -> Result<ThreatList, ScanError> {
        self.ensure_dir()?;

        let mut fallback_warning = None;
        if refresh || self.is_stale() {
            if let Err(e) = self.refresh().await {
                if !self.cache_file().exists() {
                    return Err(e);
                }
                let message = format!("{}, using cached version", e);
                tracing::warn!("{}", message);
                fallback_warning = Some(message);
            }
        }

        let mut threats = self.load()?;
        threats.fallback_warning = fallback_warning;
        Ok(threats)
    }

    async fn refresh(&self) -> Result<usize, ScanError> {
        tracing::info!(source = self.source.name(), url = %self.config.url, "Fetching compromised packages list...");

        let body = self.source.fetch().await?;
        validate_package_list(
            &body,
            &self.config.expected_header,
            self.config.min_expected_packages,
        )?;
        self.write_atomic(&body)?;

        let count = count_packages(&body);
        tracing::info!(count, "Cached compromised packages");
        Ok(count)
    }

    /// Writes beside the cache file, then renames over it.
    fn write_atomic(&self, body: &str) -> Result<(), ScanError> {
        let dir = &self.config.cache_dir;
        let path = self.cache_file();

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ScanError::io(dir, e))?;
        tmp.write_all(body.as_bytes())
            .map_err(|e| ScanError::io(&path, e))?;
        tmp.persist(&path).map_err(|e| ScanError::io(&path, e.error))?;
        Ok(())
    }

    /// Reads the cache file into a [`ThreatList`].
    ///
    /// Blank lines, `#` comments and lines without a colon are skipped.
    pub fn load(&self) -> Result<ThreatList, ScanError> {
        let path = self.cache_file();
        if !path.exists() {
            return Err(ScanError::ThreatListUnavailable { path });
        }

        let content = fs::read_to_string(&path).map_err(|e| ScanError::io(&path, e))?;
        let mut threats: ThreatList = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#') && line.contains(':'))
            .map(str::to_string)
            .collect();

        threats.refreshed_at = fs::metadata(&path)
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from);
        threats.source_path = path;
        Ok(threats)
    }

    /// Removes the cached list. Returns whether a file was deleted.
    pub fn clear(&self) -> Result<bool, ScanError> {
        clear_cache_file(&self.cache_file())
    }
}

/// Removes a cached list without building a download client.
pub fn clear_cache_file(path: &Path) -> Result<bool, ScanError> {
    if !path.exists() {
        return Ok(false);
    }
    fs::remove_file(path).map_err(|e| ScanError::io(path, e))?;
    Ok(true)
}
