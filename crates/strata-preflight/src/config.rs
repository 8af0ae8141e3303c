//! Preflight configuration
//!
//! Defaults come from the environment; the CLI overrides individual fields.

use std::path::PathBuf;
use std::time::Duration;

use strata_common::{Error, Result};

/// Environment variable holding the pass deadline in seconds (0 disables it)
pub const TIMEOUT_ENV: &str = "STRATA_PREFLIGHT_TIMEOUT_SECS";
/// Environment variable holding the git private key path
pub const GIT_PRIVATE_KEY_FILE_ENV: &str = "STRATA_GIT_PRIVATE_KEY_FILE";
/// Environment variable holding the git known-hosts path
pub const GIT_KNOWN_HOSTS_FILE_ENV: &str = "STRATA_GIT_KNOWN_HOSTS_FILE";

/// Deadline applied to a whole pass unless configured otherwise
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

/// Credentials for generic git GitOps providers
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GitCredentials {
    /// SSH private key used to reach the repository
    pub private_key_file: Option<PathBuf>,
    /// Known-hosts file pinning the git server key
    pub known_hosts_file: Option<PathBuf>,
}

impl GitCredentials {
    /// Whether any credential is set
    pub fn is_empty(&self) -> bool {
        self.private_key_file.is_none() && self.known_hosts_file.is_none()
    }
}

/// Settings of one preflight pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PreflightConfig {
    /// Deadline for the whole pass; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Credentials for git GitOps checks
    pub git_credentials: Option<GitCredentials>,
}

impl Default for PreflightConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            git_credentials: None,
        }
    }
}

impl PreflightConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let timeout = match get(TIMEOUT_ENV) {
            None => Some(DEFAULT_TIMEOUT),
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| {
                    Error::validation(format!("{TIMEOUT_ENV} must be a number of seconds, got {raw}"))
                })?;
                timeout_from_secs(secs)
            }
        };

        let credentials = GitCredentials {
            private_key_file: get(GIT_PRIVATE_KEY_FILE_ENV).map(PathBuf::from),
            known_hosts_file: get(GIT_KNOWN_HOSTS_FILE_ENV).map(PathBuf::from),
        };

        Ok(Self {
            timeout,
            git_credentials: (!credentials.is_empty()).then_some(credentials),
        })
    }
}

/// Deadline for a number of seconds, where 0 disables it
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
