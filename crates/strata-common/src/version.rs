//! Kubernetes version parsing
//!
//! Cluster specs carry versions as "1.30", "1.30.2" or "v1.30.2". Preflight
//! checks only ever compare major and minor components.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Major and minor components of a Kubernetes version
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KubeVersion {
    /// Major version (always 1 in practice)
    pub major: u64,
    /// Minor version
    pub minor: u64,
}

impl KubeVersion {
    /// Create a version from its components
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }

    /// Absolute distance between the minor versions of `self` and `other`
    pub fn minor_skew(&self, other: &KubeVersion) -> u64 {
        self.minor.abs_diff(other.minor)
    }
}

impl FromStr for KubeVersion {
    type Err = Error;

    fn from_str(version: &str) -> Result<Self> {
        let invalid = || {
            Error::validation(format!(
                "invalid kubernetes version: {version}, expected format: 1.x.x or v1.x.x"
            ))
        };

        let trimmed = version.trim();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        let mut parts = trimmed.split('.');

        let major = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        let minor = parts
            .next()
            .and_then(|p| p.parse::<u64>().ok())
            .ok_or_else(invalid)?;
        // A patch component may carry pre-release or build suffixes; only its
        // leading digits matter.
        if let Some(patch) = parts.next() {
            if !patch.starts_with(|c: char| c.is_ascii_digit()) {
                return Err(invalid());
            }
        }
        if parts.next().is_some() || major != 1 {
            return Err(invalid());
        }

        Ok(Self { major, minor })
    }
}

impl fmt::Display for KubeVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Parse a version string into its major and minor components
pub fn parse_kube_version(version: &str) -> Result<KubeVersion> {
    version.parse()
}
