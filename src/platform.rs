//! Cross-platform path resolution.
//!
//! This module finds where lockscan keeps its cache and configuration, and
//! which system CA bundle the threat list download trusts.

use std::path::{Path, PathBuf};

const APP_NAME: &str = "lockscan";

/// Well-known CA bundle locations, checked in order.
pub const CA_BUNDLE_PATHS: [&str; 5] = [
    "/etc/ssl/certs/ca-certificates.crt",     // Debian/Ubuntu
    "/etc/pki/tls/certs/ca-bundle.crt",       // RHEL/CentOS
    "/etc/ssl/ca-bundle.pem",                 // OpenSUSE
    "/usr/local/share/certs/ca-root-nss.crt", // FreeBSD
    "/etc/ssl/cert.pem",                      // macOS
];

/// Returns the cache directory for lockscan.
///
/// Resolution order:
/// - `$XDG_CACHE_HOME/lockscan/` when the variable is set and non-empty
/// - `~/.cache/lockscan/`
///
/// Falls back to `/tmp/lockscan/` if no home directory can be determined.
pub fn cache_dir() -> PathBuf {
    resolve_cache_dir(std::env::var_os("XDG_CACHE_HOME").map(PathBuf::from), dirs::home_dir())
}

fn resolve_cache_dir(xdg_cache_home: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    let base = match xdg_cache_home {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => home
            .map(|h| h.join(".cache"))
            .unwrap_or_else(|| PathBuf::from("/tmp")),
    };
    base.join(APP_NAME)
}

/// Returns the path to the configuration file.
///
/// Platform-specific locations:
/// - Linux: `~/.config/lockscan/config.toml`
/// - macOS: `~/Library/Application Support/lockscan/config.toml`
/// - Windows: `%APPDATA%\lockscan\config.toml`
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join("config.toml")
}

/// Returns the first system CA bundle that exists, if any.
pub fn find_ca_bundle() -> Option<PathBuf> {
    let candidates: Vec<&Path> = CA_BUNDLE_PATHS.iter().map(Path::new).collect();
    find_existing(&candidates)
}

fn find_existing(candidates: &[&Path]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|path| path.is_file())
        .map(|path| path.to_path_buf())
}
