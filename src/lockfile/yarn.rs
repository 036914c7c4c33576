//! `yarn.lock` (v1) parsing.
//!
//! The v1 format is not YAML. Declarations start at column 0 and the first
//! indented `version` line below one pins it:
//!
//! ```text
//! "@babel/core@^7.0.0", "@babel/core@^7.1.0":
//!   version "7.1.2"
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::PackageIdentity;

static HEADER_RE: OnceLock<Regex> = OnceLock::new();
static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn header_re() -> &'static Regex {
    // First specifier only; a leading @ belongs to the scope, not the range
    HEADER_RE.get_or_init(|| {
        Regex::new(r#"^["']?(@?[^@"',\s]+)@.*:\s*$"#).expect("yarn header pattern is valid")
    })
}

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| {
        Regex::new(r#"^\s+version\s+["']?([^"'\s]+)["']?"#).expect("yarn version pattern is valid")
    })
}

/// Parses `yarn.lock` content. Lines that fit neither pattern are skipped.
pub fn parse_yarn_lock(content: &str) -> Vec<PackageIdentity> {
    let mut packages = BTreeSet::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        if line.starts_with('#') {
            continue;
        }

        if let Some(caps) = header_re().captures(line) {
            current = Some(caps[1].to_string());
        } else if let Some(caps) = version_re().captures(line) {
            if let Some(name) = current.take() {
                packages.insert(PackageIdentity::new(name, &caps[1]));
            }
        }
    }

    packages.into_iter().collect()
}
