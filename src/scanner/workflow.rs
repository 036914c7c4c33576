//! GitHub Actions backdoor detection.
//!
//! Two known patterns are flagged under `.github/workflows/`:
//!
//! - `discussion.yaml` / `discussion.yml` that runs on a self-hosted runner
//!   and interpolates `github.event.discussion.body` straight into a step
//! - any `formatter_*.yml`, which is flagged on presence alone

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::model::BackdoorKind;

const DISCUSSION_FILES: [&str; 2] = ["discussion.yaml", "discussion.yml"];
const SECRETS_EXTRACTION_PATTERN: &str = "formatter_*.yml";

static DISCUSSION_BODY_RE: OnceLock<Regex> = OnceLock::new();

fn discussion_body_re() -> &'static Regex {
    DISCUSSION_BODY_RE.get_or_init(|| {
        Regex::new(r"\$\{\{\s*github\.event\.discussion\.body\s*\}\}")
            .expect("discussion body pattern is valid")
    })
}

/// Path of the workflows directory for a project root.
pub fn workflows_dir(root: &Path) -> PathBuf {
    root.join(".github").join("workflows")
}

/// Finds `.github/workflows` directories to inspect.
///
/// Without `recursive` only the root's own directory is considered. With it,
/// every nested project is included, limited to `max_depth` levels below
/// `root` when set.
pub fn find_workflow_dirs(root: &Path, recursive: bool, max_depth: Option<usize>) -> Vec<PathBuf> {
    if !recursive {
        let dir = workflows_dir(root);
        return if dir.is_dir() { vec![dir] } else { Vec::new() };
    }

    let mut walker = WalkDir::new(root).min_depth(2).sort_by_file_name();
    if let Some(depth) = max_depth {
        // <project>/.github/workflows sits two levels below the project
        walker = walker.max_depth(depth + 2);
    }

    walker
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.file_name() == "workflows")
        .filter(|entry| {
            entry
                .path()
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|name| name == ".github")
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Returns the backdoor workflows found in one workflows directory.
pub fn scan_workflows(dir: &Path) -> Vec<(PathBuf, BackdoorKind)> {
    let mut found = Vec::new();

    for name in DISCUSSION_FILES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        match fs::read(&path) {
            Ok(bytes) => {
                if is_discussion_backdoor(&String::from_utf8_lossy(&bytes)) {
                    found.push((path, BackdoorKind::DiscussionBackdoor));
                }
            }
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "cannot read workflow"),
        }
    }

    let mut formatters: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| glob_match(SECRETS_EXTRACTION_PATTERN, name))
            })
            .map(|entry| entry.path())
            .collect(),
        Err(e) => {
            tracing::warn!(path = %dir.display(), error = %e, "cannot list workflows");
            Vec::new()
        }
    };
    formatters.sort();
    found.extend(
        formatters
            .into_iter()
            .map(|path| (path, BackdoorKind::SecretsExtraction)),
    );

    found
}

/// A discussion workflow is a backdoor only when all three markers appear.
pub fn is_discussion_backdoor(content: &str) -> bool {
    content.contains("discussion")
        && content.contains("self-hosted")
        && discussion_body_re().is_match(content)
}

/// Simple glob matching (supports * as wildcard).
fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();

    if parts.len() == 1 {
        return pattern == text;
    }

    let mut remaining = text;

    // Check prefix (before first *)
    if !parts[0].is_empty() {
        if !remaining.starts_with(parts[0]) {
            return false;
        }
        remaining = &remaining[parts[0].len()..];
    }

    // Check suffix (after last *)
    let last_part = parts[parts.len() - 1];
    if !last_part.is_empty() {
        if !remaining.ends_with(last_part) {
            return false;
        }
        remaining = &remaining[..remaining.len() - last_part.len()];
    }

    for part in &parts[1..parts.len() - 1] {
        if part.is_empty() {
            continue;
        }
        if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }

    true
}
