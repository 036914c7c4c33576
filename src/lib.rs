pub mod cache;
pub mod config;
pub mod error;
pub mod lockfile;
pub mod model;
pub mod output;
pub mod platform;
pub mod scanner;
pub mod threat;

pub use cache::ThreatListCache;
pub use config::{Config, ThreatListConfig};
pub use error::{ScanError, ValidationError};
pub use model::{Finding, PackageIdentity, ScanResult, ScanStatus, ThreatList};
pub use scanner::{RepoScanner, ScanOptions};
