//! Core data types for lockfiles, findings, and scan results.
//!
//! This module contains the fundamental types used throughout lockscan:
//!
//! - [`PackageIdentity`] - A `name:version` pair declared by a lockfile
//! - [`LockfileFormat`] - Which package manager wrote a lockfile
//! - [`ThreatList`] - The loaded set of known compromised packages
//! - [`Finding`] - A single compromised package, backdoor workflow, or warning
//! - [`ScanResult`] - Complete scan results with a derived [`ScanStatus`]
//!
//! # Example
//!
//! ```
//! use lockscan::model::{PackageIdentity, ScanStatus};
//!
//! let pkg = PackageIdentity::new("@ctrl/tinycolor", "4.1.1");
//! assert_eq!(pkg.to_string(), "@ctrl/tinycolor:4.1.1");
//! assert_eq!(ScanStatus::Infected.exit_code(), 1);
//! ```

mod finding;
mod package;
mod result;
mod threat_list;

pub use finding::*;
pub use package::*;
pub use result::*;
pub use threat_list::*;
