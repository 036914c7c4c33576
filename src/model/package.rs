use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// A package pinned by a lockfile, canonically written as `name:version`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PackageIdentity {
    pub name: String,
    pub version: String,
}

impl PackageIdentity {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for PackageIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.name, self.version)
    }
}

impl FromStr for PackageIdentity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((name, version)) if !name.is_empty() && !version.is_empty() => {
                Ok(Self::new(name, version))
            }
            _ => Err(format!("Invalid package identity: {}. Expected name:version", s)),
        }
    }
}

impl From<PackageIdentity> for String {
    fn from(pkg: PackageIdentity) -> Self {
        pkg.to_string()
    }
}

impl TryFrom<String> for PackageIdentity {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockfileFormat {
    #[serde(rename = "npm-v1")]
    NpmV1,
    #[serde(rename = "npm-v2/v3")]
    NpmV2V3,
    #[serde(rename = "yarn-v1")]
    YarnV1,
    #[serde(rename = "pnpm")]
    Pnpm,
}

impl LockfileFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LockfileFormat::NpmV1 => "npm-v1",
            LockfileFormat::NpmV2V3 => "npm-v2/v3",
            LockfileFormat::YarnV1 => "yarn-v1",
            LockfileFormat::Pnpm => "pnpm",
        }
    }
}

impl fmt::Display for LockfileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed lockfile: where it lives, who wrote it, and what it pins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lockfile {
    pub path: PathBuf,
    pub format: LockfileFormat,
    pub packages: Vec<PackageIdentity>,
}
