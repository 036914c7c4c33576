//! Lockfile discovery and parsing.
//!
//! Three formats are understood, dispatched by file name:
//!
//! | File | Format | Strategy |
//! |------|--------|----------|
//! | `package-lock.json` | npm v1, v2, v3 | JSON, fails on malformed input |
//! | `yarn.lock` | yarn v1 | line scanning, best effort |
//! | `pnpm-lock.yaml` | pnpm | line scanning, best effort |
//!
//! Any other file name parses to nothing.
//!
//! # Example
//!
//! ```no_run
//! use lockscan::lockfile::{find_lockfiles, parse};
//! use std::path::Path;
//!
//! for path in find_lockfiles(Path::new("."), false) {
//!     let packages = parse(&path)?;
//!     println!("{}: {} packages", path.display(), packages.len());
//! }
//! # Ok::<(), lockscan::ScanError>(())
//! ```

mod npm;
mod pnpm;
mod yarn;

pub use npm::parse_package_lock;
pub use pnpm::parse_pnpm_lock;
pub use yarn::parse_yarn_lock;

use crate::error::ScanError;
use crate::model::{Lockfile, LockfileFormat, PackageIdentity};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const PACKAGE_LOCK: &str = "package-lock.json";
pub const YARN_LOCK: &str = "yarn.lock";
pub const PNPM_LOCK: &str = "pnpm-lock.yaml";

/// Lockfile names, in the order they are reported for a single directory.
pub const LOCKFILE_NAMES: [&str; 3] = [PACKAGE_LOCK, YARN_LOCK, PNPM_LOCK];

/// Parses a lockfile into its package identities.
///
/// Unknown file names and missing files yield an empty list.
///
/// # Errors
///
/// Returns [`ScanError::LockfileParse`] for malformed `package-lock.json`
/// content and [`ScanError::Io`] when the file cannot be read.
pub fn parse(path: &Path) -> Result<Vec<PackageIdentity>, ScanError> {
    Ok(parse_lockfile(path)?
        .map(|lockfile| lockfile.packages)
        .unwrap_or_default())
}

/// Parses a lockfile, keeping its path and detected format.
///
/// Returns `Ok(None)` when the file name is not a known lockfile or the file
/// does not exist.
pub fn parse_lockfile(path: &Path) -> Result<Option<Lockfile>, ScanError> {
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) if LOCKFILE_NAMES.contains(&name) => name,
        _ => return Ok(None),
    };

    if !path.is_file() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|e| ScanError::io(path, e))?;

    let (format, packages) = match name {
        PACKAGE_LOCK => parse_package_lock(&content).map_err(|e| ScanError::LockfileParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?,
        YARN_LOCK => (LockfileFormat::YarnV1, parse_yarn_lock(&content)),
        _ => (LockfileFormat::Pnpm, parse_pnpm_lock(&content)),
    };

    Ok(Some(Lockfile {
        path: path.to_path_buf(),
        format,
        packages,
    }))
}

/// Finds lockfiles in `dir`, or anywhere beneath it when `recursive` is set.
pub fn find_lockfiles(dir: &Path, recursive: bool) -> Vec<PathBuf> {
    find_lockfiles_with_depth(dir, recursive, None)
}

/// Like [`find_lockfiles`], limiting a recursive walk to `max_depth`
/// directory levels below `dir`.
///
/// Results are in sorted traversal order, so a fixed tree always gives the
/// same list.
pub fn find_lockfiles_with_depth(
    dir: &Path,
    recursive: bool,
    max_depth: Option<usize>,
) -> Vec<PathBuf> {
    if !recursive {
        return LOCKFILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .filter(|path| path.is_file())
            .collect();
    }

    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if let Some(depth) = max_depth {
        // Files sit one level below the directory that holds them
        walker = walker.max_depth(depth + 1);
    }

    walker
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::debug!(error = %e, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .file_name()
                .to_str()
                .is_some_and(|name| LOCKFILE_NAMES.contains(&name))
        })
        .map(|entry| entry.into_path())
        .collect()
}
