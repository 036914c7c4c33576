//! `pnpm-lock.yaml` parsing.
//!
//! Only the keys of the top-level `packages:` section are read:
//!
//! ```yaml
//! packages:
//!   /@ctrl/tinycolor@4.1.1:
//!     resolution: {integrity: sha512-...}
//!   '@babel/core@7.24.0':
//!     resolution: {integrity: sha512-...}
//! ```

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;

use crate::model::PackageIdentity;

static TOP_LEVEL_KEY_RE: OnceLock<Regex> = OnceLock::new();
static ENTRY_RE: OnceLock<Regex> = OnceLock::new();

fn top_level_key_re() -> &'static Regex {
    TOP_LEVEL_KEY_RE
        .get_or_init(|| Regex::new(r"^\w+:").expect("pnpm section pattern is valid"))
}

fn entry_re() -> &'static Regex {
    // Optional quote and leading slash, then name@version, an optional
    // peer suffix like (react@18.2.0), and the closing colon.
    ENTRY_RE.get_or_init(|| {
        Regex::new(
            r#"^ {2}["']?/?(@?[^@:'"\s/][^@:'"\s]*)@([^:'"\s()]+)(?:\([^'"]*\))?["']?:"#,
        )
        .expect("pnpm entry pattern is valid")
    })
}

/// Parses `pnpm-lock.yaml` content. Lines outside `packages:` never count.
pub fn parse_pnpm_lock(content: &str) -> Vec<PackageIdentity> {
    let mut packages = BTreeSet::new();
    let mut in_packages = false;

    for line in content.lines() {
        if line.starts_with("packages:") {
            in_packages = true;
            continue;
        }

        if in_packages && top_level_key_re().is_match(line) {
            in_packages = false;
            continue;
        }

        if !in_packages {
            continue;
        }

        if let Some(caps) = entry_re().captures(line) {
            packages.insert(PackageIdentity::new(&caps[1], &caps[2]));
        }
    }

    packages.into_iter().collect()
}
