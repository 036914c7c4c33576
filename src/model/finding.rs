use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use super::PackageIdentity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackdoorKind {
    /// Discussion-triggered workflow running untrusted input on a self-hosted runner.
    DiscussionBackdoor,
    /// `formatter_*.yml` workflow dropped to exfiltrate repository secrets.
    SecretsExtraction,
}

impl BackdoorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackdoorKind::DiscussionBackdoor => "discussion_backdoor",
            BackdoorKind::SecretsExtraction => "secrets_extraction",
        }
    }
}

impl fmt::Display for BackdoorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Finding {
    CompromisedPackage {
        lockfile_path: PathBuf,
        package: PackageIdentity,
    },
    BackdoorWorkflow {
        file_path: PathBuf,
        kind: BackdoorKind,
    },
    Warning {
        message: String,
    },
}

impl Finding {
    pub fn warning(message: impl Into<String>) -> Self {
        Finding::Warning {
            message: message.into(),
        }
    }

    pub fn is_compromised_package(&self) -> bool {
        matches!(self, Finding::CompromisedPackage { .. })
    }

    pub fn is_backdoor(&self) -> bool {
        matches!(self, Finding::BackdoorWorkflow { .. })
    }
}
