use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::{BackdoorKind, Finding, LockfileFormat, PackageIdentity, ThreatListInfo};

/// Overall verdict of a scan, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ScanStatus {
    Clean,
    Warning,
    Infected,
}

impl ScanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanStatus::Clean => "CLEAN",
            ScanStatus::Warning => "WARNING",
            ScanStatus::Infected => "INFECTED",
        }
    }

    /// Process exit code: 0 clean, 1 infected, 2 backdoor warning.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScanStatus::Clean => 0,
            ScanStatus::Infected => 1,
            ScanStatus::Warning => 2,
        }
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one lockfile during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockfileReport {
    pub path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<LockfileFormat>,
    pub packages: usize,
    pub compromised: Vec<PackageIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Findings for one scan invocation.
///
/// Built by the scanner, then read-only. The status is always derived from
/// the findings, so it cannot drift from them.
#[derive(Debug, Clone)]
pub struct ScanResult {
    pub scanned_path: PathBuf,
    pub recursive: bool,
    pub findings: Vec<Finding>,
    pub lockfiles: Vec<LockfileReport>,
    pub threat_list: ThreatListInfo,
}

impl ScanResult {
    pub fn new(scanned_path: PathBuf, recursive: bool, threat_list: ThreatListInfo) -> Self {
        Self {
            scanned_path,
            recursive,
            findings: Vec::new(),
            lockfiles: Vec::new(),
            threat_list,
        }
    }

    pub fn status(&self) -> ScanStatus {
        if self.findings.iter().any(Finding::is_compromised_package) {
            ScanStatus::Infected
        } else if self.findings.iter().any(Finding::is_backdoor) {
            ScanStatus::Warning
        } else {
            ScanStatus::Clean
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.status().exit_code()
    }

    pub fn compromised_packages(&self) -> impl Iterator<Item = (&PathBuf, &PackageIdentity)> {
        self.findings.iter().filter_map(|f| match f {
            Finding::CompromisedPackage {
                lockfile_path,
                package,
            } => Some((lockfile_path, package)),
            _ => None,
        })
    }

    pub fn backdoors(&self) -> impl Iterator<Item = (&PathBuf, BackdoorKind)> {
        self.findings.iter().filter_map(|f| match f {
            Finding::BackdoorWorkflow { file_path, kind } => Some((file_path, *kind)),
            _ => None,
        })
    }

    pub fn warnings(&self) -> impl Iterator<Item = &str> {
        self.findings.iter().filter_map(|f| match f {
            Finding::Warning { message } => Some(message.as_str()),
            _ => None,
        })
    }

    pub fn packages_scanned(&self) -> usize {
        self.lockfiles.iter().map(|l| l.packages).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(findings: Vec<Finding>) -> ScanResult {
        let mut result = ScanResult::new(PathBuf::from("."), false, ThreatListInfo::default());
        result.findings = findings;
        result
    }

    fn compromised() -> Finding {
        Finding::CompromisedPackage {
            lockfile_path: PathBuf::from("package-lock.json"),
            package: PackageIdentity::new("@ctrl/tinycolor", "4.1.1"),
        }
    }

    fn backdoor() -> Finding {
        Finding::BackdoorWorkflow {
            file_path: PathBuf::from(".github/workflows/formatter_1.yml"),
            kind: BackdoorKind::SecretsExtraction,
        }
    }

    #[test]
    fn test_status_clean_with_only_warnings() {
        let result = result_with(vec![Finding::warning("No lockfiles found")]);
        assert_eq!(result.status(), ScanStatus::Clean);
        assert_eq!(result.exit_code(), 0);
    }

    #[test]
    fn test_status_warning_for_backdoor() {
        let result = result_with(vec![backdoor()]);
        assert_eq!(result.status(), ScanStatus::Warning);
        assert_eq!(result.exit_code(), 2);
    }

    #[test]
    fn test_infected_outranks_backdoor() {
        let result = result_with(vec![backdoor(), compromised()]);
        assert_eq!(result.status(), ScanStatus::Infected);
        assert_eq!(result.exit_code(), 1);
    }

    #[test]
    fn test_status_serializes_uppercase() {
        assert_eq!(
            serde_json::to_string(&ScanStatus::Infected).unwrap(),
            "\"INFECTED\""
        );
    }
}
