//! Error types for lockfile scanning.
//!
//! [`ScanError`] covers every failure the library can surface:
//!
//! - **Input**: `DirectoryNotFound`
//! - **Lockfile parsing**: `LockfileParse`
//! - **File I/O**: `Io`
//! - **Threat list**: `ThreatListFetch`, `ThreatListValidation`, `ThreatListUnavailable`
//! - **Configuration**: `Config`

use std::path::PathBuf;

/// Errors raised while scanning a repository.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// The scan target does not exist or is not a directory.
    #[error("Directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// A JSON lockfile could not be parsed.
    #[error("lockfile parse error: {}: {reason}", path.display())]
    LockfileParse {
        /// Lockfile path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Reading or writing a file failed.
    #[error("io error: {}: {source}", path.display())]
    Io {
        /// Related path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Downloading the threat list failed (network, TLS, timeout or HTTP status).
    #[error("Failed to fetch compromised packages list: {0}")]
    ThreatListFetch(String),

    /// The downloaded threat list was rejected.
    #[error(transparent)]
    ThreatListValidation(#[from] ValidationError),

    /// No cached threat list exists and none could be fetched.
    #[error(
        "No compromised packages list available at {}. Check your network connection.",
        path.display()
    )]
    ThreatListUnavailable {
        /// Expected cache file path
        path: PathBuf,
    },

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl ScanError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ScanError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Reasons a downloaded threat list is refused before it reaches the cache.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Downloaded file missing expected header - possible MITM or corrupted file")]
    MissingHeader,

    #[error("Downloaded file has only {found} packages (expected {expected}+) - possible truncation")]
    TooFewPackages { found: usize, expected: usize },

    #[error("Downloaded file contains invalid package format - possible corruption: {line}")]
    InvalidFormat { line: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_not_found_display() {
        let err = ScanError::DirectoryNotFound(PathBuf::from("/nope"));
        assert_eq!(err.to_string(), "Directory not found: /nope");
    }

    #[test]
    fn lockfile_parse_display() {
        let err = ScanError::LockfileParse {
            path: PathBuf::from("app/package-lock.json"),
            reason: "expected value at line 1 column 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("app/package-lock.json"));
        assert!(msg.contains("expected value"));
    }

    #[test]
    fn validation_error_converts() {
        let err: ScanError = ValidationError::TooFewPackages {
            found: 3,
            expected: 500,
        }
        .into();
        assert!(matches!(err, ScanError::ThreatListValidation(_)));
        assert!(err.to_string().contains("only 3 packages"));
    }
}
