use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::PathBuf;

use super::PackageIdentity;

/// The set of known compromised `name:version` strings, as loaded from the cache.
#[derive(Debug, Clone, Default)]
pub struct ThreatList {
    packages: HashSet<String>,
    /// Cache file the list was read from.
    pub source_path: PathBuf,
    /// Modification time of the cache file.
    pub refreshed_at: Option<DateTime<Utc>>,
    /// Set when a refresh failed and the previous cache was used instead.
    pub fallback_warning: Option<String>,
}

impl ThreatList {
    pub fn new(packages: HashSet<String>) -> Self {
        Self {
            packages,
            ..Self::default()
        }
    }

    pub fn contains(&self, package: &PackageIdentity) -> bool {
        self.packages.contains(&package.to_string())
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn info(&self) -> ThreatListInfo {
        ThreatListInfo {
            entries: self.packages.len(),
            path: self.source_path.clone(),
            refreshed_at: self.refreshed_at,
            stale_fallback: self.fallback_warning.is_some(),
        }
    }
}

impl FromIterator<String> for ThreatList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Summary of the threat list a scan was checked against.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ThreatListInfo {
    pub entries: usize,
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refreshed_at: Option<DateTime<Utc>>,
    pub stale_fallback: bool,
}
