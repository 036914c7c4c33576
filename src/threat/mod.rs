//! Where the compromised package list comes from, and how it is checked.
//!
//! [`ThreatListSource`] is the download seam used by the cache. The real
//! implementation is [`HttpThreatSource`]; tests swap in fixed bodies.

mod http;
mod validate;

pub use http::HttpThreatSource;
pub use validate::{count_packages, is_valid_entry, validate_package_list};

use crate::config::ThreatListConfig;
use crate::error::ScanError;
use async_trait::async_trait;

#[async_trait]
pub trait ThreatListSource: Send + Sync {
    /// Human-readable name for log lines.
    fn name(&self) -> &'static str;

    /// Downloads the raw list body.
    ///
    /// # Errors
    ///
    /// Any network, TLS, timeout or HTTP status failure is reported as
    /// [`ScanError::ThreatListFetch`].
    async fn fetch(&self) -> Result<String, ScanError>;
}

pub fn default_source(config: &ThreatListConfig) -> Result<HttpThreatSource, ScanError> {
    HttpThreatSource::new(&config.url, config.timeout)
}
