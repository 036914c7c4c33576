//! `package-lock.json` parsing.
//!
//! Two overlapping tables are read and unioned:
//!
//! ```json
//! {
//!   "lockfileVersion": 2,
//!   "packages": {
//!     "": { "name": "my-app", "version": "1.0.0" },
//!     "node_modules/@ctrl/tinycolor": { "version": "4.1.1" }
//!   },
//!   "dependencies": {
//!     "a": { "version": "1.0.0", "dependencies": { "b": { "version": "2.0.0" } } }
//!   }
//! }
//! ```
//!
//! `packages` (v2/v3) is keyed by install path; `dependencies` (v1, kept in v2
//! for older npm) nests deduplicated installs, recorded as `parent/child`.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::model::{LockfileFormat, PackageIdentity};

const NODE_MODULES: &str = "node_modules/";

/// Parses `package-lock.json` content.
///
/// The format is `npm-v2/v3` when a `packages` table is present or
/// `lockfileVersion` is at least 2, otherwise `npm-v1`.
pub fn parse_package_lock(
    content: &str,
) -> Result<(LockfileFormat, Vec<PackageIdentity>), serde_json::Error> {
    let root: Value = serde_json::from_str(content)?;
    let mut packages = BTreeSet::new();

    let packages_table = root.get("packages").and_then(Value::as_object);
    if let Some(table) = packages_table {
        collect_packages(table, &mut packages);
    }

    if let Some(deps) = root.get("dependencies").and_then(Value::as_object) {
        collect_dependencies(deps, "", &mut packages);
    }

    let lockfile_version = root.get("lockfileVersion").and_then(Value::as_u64);
    let format = if packages_table.is_some() || lockfile_version.is_some_and(|v| v >= 2) {
        LockfileFormat::NpmV2V3
    } else {
        LockfileFormat::NpmV1
    };

    Ok((format, packages.into_iter().collect()))
}

fn collect_packages(table: &Map<String, Value>, out: &mut BTreeSet<PackageIdentity>) {
    for (key, info) in table {
        // Root project
        if key.is_empty() {
            continue;
        }
        let Some(version) = info.get("version").and_then(Value::as_str) else {
            continue;
        };

        // Only the leading prefix; nested and workspace paths keep the rest of the key
        let name = key.strip_prefix(NODE_MODULES).unwrap_or(key);
        if name.is_empty() {
            continue;
        }

        out.insert(PackageIdentity::new(name, version));
    }
}

fn collect_dependencies(
    deps: &Map<String, Value>,
    prefix: &str,
    out: &mut BTreeSet<PackageIdentity>,
) {
    for (name, info) in deps {
        let Some(version) = info.get("version").and_then(Value::as_str) else {
            continue;
        };

        let full_name = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}/{}", prefix, name)
        };
        out.insert(PackageIdentity::new(full_name.as_str(), version));

        if let Some(nested) = info.get("dependencies").and_then(Value::as_object) {
            collect_dependencies(nested, &full_name, out);
        }
    }
}
