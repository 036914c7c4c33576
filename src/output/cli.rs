use crate::config::DEFAULT_PLAYBOOK_URL;
use crate::model::{LockfileReport, ScanResult, ScanStatus};
use std::fmt::Write as _;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct LockfileRow {
    #[tabled(rename = "Lockfile")]
    path: String,
    #[tabled(rename = "Format")]
    format: String,
    #[tabled(rename = "Packages")]
    packages: usize,
    #[tabled(rename = "Compromised")]
    compromised: usize,
}

#[derive(Debug, Clone)]
pub struct TextOptions {
    /// List every scanned lockfile, not just the ones with findings.
    pub verbose: bool,
    /// Wrap the status banner in ANSI colors.
    pub color: bool,
    pub playbook_url: String,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            color: false,
            playbook_url: DEFAULT_PLAYBOOK_URL.to_string(),
        }
    }
}

pub fn generate_text_report(result: &ScanResult, options: &TextOptions) -> String {
    let mut out = String::new();
    let root = result.scanned_path.as_path();

    let _ = writeln!(out, "Scanning: {}", root.display());
    let threat_list = &result.threat_list;
    match threat_list.refreshed_at {
        Some(at) => {
            let _ = writeln!(
                out,
                "Threat list: {} known compromised packages (updated {})",
                threat_list.entries,
                at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        None => {
            let _ = writeln!(
                out,
                "Threat list: {} known compromised packages",
                threat_list.entries
            );
        }
    }

    if options.verbose && !result.lockfiles.is_empty() {
        out.push('\n');
        out.push_str("Lockfiles:\n");
        write_tree(
            &mut out,
            "  ",
            result.lockfiles.iter().map(|l| describe_lockfile(root, l)),
        );
    }

    let infected: Vec<&LockfileReport> = result
        .lockfiles
        .iter()
        .filter(|l| !l.compromised.is_empty())
        .collect();
    if !infected.is_empty() {
        out.push('\n');
        let _ = writeln!(
            out,
            "COMPROMISED PACKAGES FOUND ({}):",
            result.compromised_packages().count()
        );
        for lockfile in infected {
            let _ = writeln!(out, "  {}", relative(root, &lockfile.path));
            write_tree(
                &mut out,
                "  ",
                lockfile.compromised.iter().map(ToString::to_string),
            );
        }
    }

    let backdoors: Vec<String> = result
        .backdoors()
        .map(|(path, kind)| format!("{} [{}]", relative(root, path), kind))
        .collect();
    if !backdoors.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "BACKDOOR WORKFLOWS FOUND ({}):", backdoors.len());
        write_tree(&mut out, "  ", backdoors.into_iter());
    }

    let warnings: Vec<&str> = result.warnings().collect();
    if !warnings.is_empty() {
        out.push('\n');
        out.push_str("Warnings:\n");
        for warning in warnings {
            let _ = writeln!(out, "  ! {}", warning);
        }
    }

    if result.recursive && !result.lockfiles.is_empty() {
        out.push('\n');
        out.push_str(&summary_table(root, &result.lockfiles));
        out.push('\n');
        let _ = writeln!(
            out,
            "Summary: {} lockfiles, {} packages, {} compromised, {} backdoor workflows",
            result.lockfiles.len(),
            result.packages_scanned(),
            result.compromised_packages().count(),
            result.backdoors().count()
        );
    }

    let status = result.status();
    out.push('\n');
    let _ = writeln!(out, "Status: {}", format_status(status, options.color));
    if status != ScanStatus::Clean {
        let _ = writeln!(out, "See the incident response playbook: {}", options.playbook_url);
    }

    out
}

fn write_tree(out: &mut String, indent: &str, items: impl Iterator<Item = String>) {
    let items: Vec<String> = items.collect();
    let last = items.len().saturating_sub(1);
    for (i, item) in items.iter().enumerate() {
        let branch = if i == last { "└─" } else { "├─" };
        let _ = writeln!(out, "{}{} {}", indent, branch, item);
    }
}

fn describe_lockfile(root: &Path, lockfile: &LockfileReport) -> String {
    let path = relative(root, &lockfile.path);
    match (&lockfile.error, lockfile.format) {
        (Some(error), _) => format!("{} (error: {})", path, error),
        (None, Some(format)) => format!("{} ({}, {} packages)", path, format, lockfile.packages),
        (None, None) => path,
    }
}

fn summary_table(root: &Path, lockfiles: &[LockfileReport]) -> String {
    let rows: Vec<LockfileRow> = lockfiles
        .iter()
        .map(|l| LockfileRow {
            path: relative(root, &l.path),
            format: l
                .format
                .map(|f| f.to_string())
                .unwrap_or_else(|| "-".to_string()),
            packages: l.packages,
            compromised: l.compromised.len(),
        })
        .collect();

    let mut table = Table::new(rows).with(Style::rounded()).to_string();
    table.push('\n');
    table
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn format_status(status: ScanStatus, color: bool) -> String {
    if !color {
        return status.to_string();
    }
    match status {
        ScanStatus::Infected => "\x1b[31mINFECTED\x1b[0m".to_string(),
        ScanStatus::Warning => "\x1b[33mWARNING\x1b[0m".to_string(),
        ScanStatus::Clean => "\x1b[32mCLEAN\x1b[0m".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BackdoorKind, Finding, LockfileFormat, PackageIdentity, ThreatListInfo};
    use std::path::PathBuf;

    fn base(recursive: bool) -> ScanResult {
        ScanResult::new(PathBuf::from("/repo"), recursive, ThreatListInfo::default())
    }

    #[test]
    fn test_clean_without_lockfiles() {
        let mut result = base(false);
        result.findings.push(Finding::warning("No lockfiles found"));

        let text = generate_text_report(&result, &TextOptions::default());
        assert!(text.contains("Scanning: /repo"));
        assert!(text.contains("No lockfiles found"));
        assert!(text.contains("Status: CLEAN"));
        assert!(!text.contains("playbook"));
    }

    #[test]
    fn test_infected_report() {
        let mut result = base(false);
        let pkg = PackageIdentity::new("@ctrl/tinycolor", "4.1.1");
        result.findings.push(Finding::CompromisedPackage {
            lockfile_path: PathBuf::from("/repo/package-lock.json"),
            package: pkg.clone(),
        });
        result.lockfiles.push(LockfileReport {
            path: PathBuf::from("/repo/package-lock.json"),
            format: Some(LockfileFormat::NpmV2V3),
            packages: 2,
            compromised: vec![pkg],
            error: None,
        });

        let text = generate_text_report(&result, &TextOptions::default());
        assert!(text.contains("COMPROMISED PACKAGES FOUND (1):"));
        assert!(text.contains("  package-lock.json\n  └─ @ctrl/tinycolor:4.1.1\n"));
        assert!(text.contains("Status: INFECTED"));
        assert!(text.contains("playbook"));
    }

    #[test]
    fn test_backdoor_report() {
        let mut result = base(false);
        result.findings.push(Finding::BackdoorWorkflow {
            file_path: PathBuf::from("/repo/.github/workflows/discussion.yaml"),
            kind: BackdoorKind::DiscussionBackdoor,
        });

        let text = generate_text_report(&result, &TextOptions::default());
        assert!(text.contains("BACKDOOR WORKFLOWS FOUND (1):"));
        assert!(text.contains(".github/workflows/discussion.yaml [discussion_backdoor]"));
        assert!(text.contains("Status: WARNING"));
    }

    #[test]
    fn test_verbose_lists_lockfiles() {
        let mut result = base(true);
        result.lockfiles.push(LockfileReport {
            path: PathBuf::from("/repo/a/yarn.lock"),
            format: Some(LockfileFormat::YarnV1),
            packages: 7,
            compromised: Vec::new(),
            error: None,
        });

        let options = TextOptions {
            verbose: true,
            ..TextOptions::default()
        };
        let text = generate_text_report(&result, &options);
        assert!(text.contains("└─ a/yarn.lock (yarn-v1, 7 packages)"));
        assert!(text.contains("Summary: 1 lockfiles, 7 packages, 0 compromised"));
    }

    #[test]
    fn test_color_banner() {
        assert_eq!(format_status(ScanStatus::Clean, false), "CLEAN");
        assert!(format_status(ScanStatus::Infected, true).contains("\x1b[31m"));
    }
}
