//! Machine-readable output.
//!
//! A single-directory scan prints one pretty JSON object. A recursive scan
//! prints JSON Lines: one object per lockfile, then a summary object.

use std::path::Path;

use anyhow::Result;
use serde::Serialize;

use crate::model::{
    BackdoorKind, LockfileReport, PackageIdentity, ScanResult, ScanStatus, ThreatListInfo,
};

#[derive(Serialize)]
struct JsonReport<'a> {
    scanned_path: &'a Path,
    status: ScanStatus,
    exit_code: u8,
    lockfiles: &'a [LockfileReport],
    compromised_packages: Vec<JsonCompromised<'a>>,
    backdoors: Vec<JsonBackdoor<'a>>,
    warnings: Vec<&'a str>,
    threat_list: &'a ThreatListInfo,
}

#[derive(Serialize)]
struct JsonCompromised<'a> {
    lockfile: &'a Path,
    package: &'a PackageIdentity,
}

#[derive(Serialize)]
struct JsonBackdoor<'a> {
    file: &'a Path,
    kind: BackdoorKind,
}

#[derive(Serialize)]
struct LockfileLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    report: &'a LockfileReport,
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    scanned_path: &'a Path,
    status: ScanStatus,
    exit_code: u8,
    lockfiles_scanned: usize,
    packages_scanned: usize,
    compromised_count: usize,
    backdoor_count: usize,
    backdoors: Vec<JsonBackdoor<'a>>,
    warnings: Vec<&'a str>,
    threat_list: &'a ThreatListInfo,
}

fn backdoors(result: &ScanResult) -> Vec<JsonBackdoor<'_>> {
    result
        .backdoors()
        .map(|(file, kind)| JsonBackdoor { file, kind })
        .collect()
}

pub fn generate_json(result: &ScanResult) -> Result<String> {
    let report = JsonReport {
        scanned_path: &result.scanned_path,
        status: result.status(),
        exit_code: result.exit_code(),
        lockfiles: &result.lockfiles,
        compromised_packages: result
            .compromised_packages()
            .map(|(lockfile, package)| JsonCompromised { lockfile, package })
            .collect(),
        backdoors: backdoors(result),
        warnings: result.warnings().collect(),
        threat_list: &result.threat_list,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

pub fn generate_json_lines(result: &ScanResult) -> Result<String> {
    let mut out = String::new();

    for report in &result.lockfiles {
        out.push_str(&serde_json::to_string(&LockfileLine {
            kind: "lockfile",
            report,
        })?);
        out.push('\n');
    }

    let summary = SummaryLine {
        kind: "summary",
        scanned_path: &result.scanned_path,
        status: result.status(),
        exit_code: result.exit_code(),
        lockfiles_scanned: result.lockfiles.len(),
        packages_scanned: result.packages_scanned(),
        compromised_count: result.compromised_packages().count(),
        backdoor_count: result.backdoors().count(),
        backdoors: backdoors(result),
        warnings: result.warnings().collect(),
        threat_list: &result.threat_list,
    };
    out.push_str(&serde_json::to_string(&summary)?);
    out.push('\n');

    Ok(out)
}
