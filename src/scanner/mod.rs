//! Repository scanning.
//!
//! [`RepoScanner`] ties the pieces together: it resolves the threat list,
//! discovers and parses lockfiles, checks every pinned package against the
//! list, and inspects GitHub workflows for known backdoors.
//!
//! # Example
//!
//! ```no_run
//! use lockscan::{cache::ThreatListCache, scanner::{RepoScanner, ScanOptions}, Config};
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = ThreatListCache::from_config(Config::default().threat_list_config())?;
//!     let scanner = RepoScanner::new(cache);
//!
//!     let result = scanner.scan(Path::new("."), &ScanOptions::default()).await?;
//!     println!("{}", result.status());
//!     Ok(())
//! }
//! ```

pub mod workflow;

use std::path::Path;

use crate::cache::ThreatListCache;
use crate::error::ScanError;
use crate::lockfile::{find_lockfiles_with_depth, parse_lockfile};
use crate::model::{Finding, LockfileReport, ScanResult, ThreatList};
use crate::threat::{HttpThreatSource, ThreatListSource};

pub const NO_LOCKFILES_WARNING: &str = "No lockfiles found";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Re-download the threat list even if the cache is fresh.
    pub refresh: bool,
    /// Walk subdirectories for lockfiles and workflows.
    pub recursive: bool,
    /// Depth limit for the recursive walk, counted in directories below the root.
    pub max_depth: Option<usize>,
}

pub struct RepoScanner<S = HttpThreatSource> {
    cache: ThreatListCache<S>,
}

impl<S: ThreatListSource> RepoScanner<S> {
    pub fn new(cache: ThreatListCache<S>) -> Self {
        Self { cache }
    }

    /// Scans `path` for compromised packages and backdoor workflows.
    ///
    /// # Errors
    ///
    /// - [`ScanError::DirectoryNotFound`] before anything is fetched
    /// - threat list errors when no usable list exists
    /// - [`ScanError::LockfileParse`] for a malformed lockfile in a
    ///   non-recursive scan
    pub async fn scan(&self, path: &Path, options: &ScanOptions) -> Result<ScanResult, ScanError> {
        ensure_directory(path)?;
        let threats = self.cache.compromised_packages(options.refresh).await?;
        scan_with_threats(path, options, &threats)
    }
}

fn ensure_directory(path: &Path) -> Result<(), ScanError> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ScanError::DirectoryNotFound(path.to_path_buf()))
    }
}

/// Runs the scan against an already loaded threat list.
///
/// In recursive mode a lockfile that fails to parse is reported as a warning
/// and the walk continues; otherwise the error aborts the scan.
pub fn scan_with_threats(
    path: &Path,
    options: &ScanOptions,
    threats: &ThreatList,
) -> Result<ScanResult, ScanError> {
    ensure_directory(path)?;

    let mut result = ScanResult::new(path.to_path_buf(), options.recursive, threats.info());
    if let Some(warning) = &threats.fallback_warning {
        result.findings.push(Finding::warning(warning.clone()));
    }

    let lockfiles = find_lockfiles_with_depth(path, options.recursive, options.max_depth);
    if lockfiles.is_empty() {
        result.findings.push(Finding::warning(NO_LOCKFILES_WARNING));
    }

    for lockfile_path in lockfiles {
        let lockfile = match parse_lockfile(&lockfile_path) {
            Ok(Some(lockfile)) => lockfile,
            Ok(None) => continue,
            Err(e) if options.recursive => {
                tracing::warn!(path = %lockfile_path.display(), error = %e, "skipping lockfile");
                result
                    .findings
                    .push(Finding::warning(format!("Skipped unparseable lockfile: {}", e)));
                result.lockfiles.push(LockfileReport {
                    path: lockfile_path,
                    format: None,
                    packages: 0,
                    compromised: Vec::new(),
                    error: Some(e.to_string()),
                });
                continue;
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(
            path = %lockfile.path.display(),
            format = %lockfile.format,
            packages = lockfile.packages.len(),
            "parsed lockfile"
        );

        let compromised: Vec<_> = lockfile
            .packages
            .iter()
            .filter(|pkg| threats.contains(pkg))
            .cloned()
            .collect();

        result
            .findings
            .extend(compromised.iter().map(|pkg| Finding::CompromisedPackage {
                lockfile_path: lockfile.path.clone(),
                package: pkg.clone(),
            }));
        result.lockfiles.push(LockfileReport {
            path: lockfile.path,
            format: Some(lockfile.format),
            packages: lockfile.packages.len(),
            compromised,
            error: None,
        });
    }

    for dir in workflow::find_workflow_dirs(path, options.recursive, options.max_depth) {
        result.findings.extend(
            workflow::scan_workflows(&dir)
                .into_iter()
                .map(|(file_path, kind)| Finding::BackdoorWorkflow { file_path, kind }),
        );
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::tests::{valid_list, StubSource};
    use crate::config::ThreatListConfig;
    use crate::model::{BackdoorKind, PackageIdentity, ScanStatus};
    use std::fs;
    use tempfile::TempDir;

    fn threats(entries: &[&str]) -> ThreatList {
        entries.iter().map(|e| e.to_string()).collect()
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_missing_directory() {
        let dir = TempDir::new().unwrap();
        let err = scan_with_threats(
            &dir.path().join("nope"),
            &ScanOptions::default(),
            &threats(&[]),
        )
        .unwrap_err();
        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_yarn_and_pnpm_hits_tied_to_lockfile() {
        let dir = TempDir::new().unwrap();
        write(
            &dir.path().join("yarn.lock"),
            "\"left-pad@^1.0.0\":\n  version \"1.3.0\"\n",
        );
        write(
            &dir.path().join("pnpm-lock.yaml"),
            "packages:\n  /@ctrl/tinycolor@4.1.1:\n    dev: false\n",
        );

        let result = scan_with_threats(
            dir.path(),
            &ScanOptions::default(),
            &threats(&["@ctrl/tinycolor:4.1.1"]),
        )
        .unwrap();

        assert_eq!(result.status(), ScanStatus::Infected);
        let hits: Vec<_> = result.compromised_packages().collect();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].0, &dir.path().join("pnpm-lock.yaml"));
        assert_eq!(hits[0].1, &PackageIdentity::new("@ctrl/tinycolor", "4.1.1"));
        assert_eq!(result.lockfiles.len(), 2);
    }

    #[test]
    fn test_malformed_lockfile_aborts_single_scan() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("package-lock.json"), "{ nope");

        let err =
            scan_with_threats(dir.path(), &ScanOptions::default(), &threats(&[])).unwrap_err();
        assert!(matches!(err, ScanError::LockfileParse { .. }));
    }

    #[test]
    fn test_malformed_lockfile_isolated_in_recursive_scan() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("broken").join("package-lock.json"), "{ nope");
        write(
            &dir.path().join("ok").join("package-lock.json"),
            r#"{"packages": {"node_modules/evil": {"version": "6.6.6"}}}"#,
        );
        let options = ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        };

        let result = scan_with_threats(dir.path(), &options, &threats(&["evil:6.6.6"])).unwrap();

        assert_eq!(result.status(), ScanStatus::Infected);
        assert_eq!(result.lockfiles.len(), 2);
        assert!(result.lockfiles[0].error.is_some());
        assert!(result
            .warnings()
            .any(|w| w.starts_with("Skipped unparseable lockfile")));
    }

    #[test]
    fn test_nested_backdoor_only_found_recursively() {
        let dir = TempDir::new().unwrap();
        write(&dir.path().join("package-lock.json"), "{}");
        write(
            &dir.path()
                .join("service")
                .join(".github")
                .join("workflows")
                .join("formatter_42.yml"),
            "name: Formatter\n",
        );

        let flat = scan_with_threats(dir.path(), &ScanOptions::default(), &threats(&[])).unwrap();
        assert_eq!(flat.status(), ScanStatus::Clean);

        let options = ScanOptions {
            recursive: true,
            ..ScanOptions::default()
        };
        let deep = scan_with_threats(dir.path(), &options, &threats(&[])).unwrap();
        assert_eq!(deep.status(), ScanStatus::Warning);
        assert_eq!(
            deep.backdoors().map(|(_, kind)| kind).collect::<Vec<_>>(),
            vec![BackdoorKind::SecretsExtraction]
        );
    }

    #[tokio::test]
    async fn test_scan_checks_directory_before_fetching() {
        let dir = TempDir::new().unwrap();
        let cache = ThreatListCache::new(
            ThreatListConfig::with_cache_dir(dir.path().join("cache")),
            StubSource::ok(valid_list(&[])),
        );
        let scanner = RepoScanner::new(cache);

        let err = scanner
            .scan(&dir.path().join("missing"), &ScanOptions::default())
            .await
            .unwrap_err();

        assert!(matches!(err, ScanError::DirectoryNotFound(_)));
        assert!(!dir.path().join("cache").exists());
    }

    #[tokio::test]
    async fn test_scan_surfaces_cache_fallback_warning() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("cache");
        fs::create_dir_all(&cache_dir).unwrap();
        fs::write(cache_dir.join("compromised-packages.txt"), "left-pad:1.3.0\n").unwrap();
        let cache = ThreatListCache::new(
            ThreatListConfig::with_cache_dir(&cache_dir),
            StubSource::failing("HTTP 500"),
        );
        let scanner = RepoScanner::new(cache);
        let repo = dir.path().join("repo");
        write(
            &repo.join("yarn.lock"),
            "left-pad@^1.0.0:\n  version \"1.3.0\"\n",
        );

        let options = ScanOptions {
            refresh: true,
            ..ScanOptions::default()
        };
        let result = scanner.scan(&repo, &options).await.unwrap();

        assert_eq!(result.status(), ScanStatus::Infected);
        assert!(result.threat_list.stale_fallback);
        assert!(result.warnings().any(|w| w.contains("using cached version")));
    }
}
