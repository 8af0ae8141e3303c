//! Findings and the composite validation error
//!
//! Every check in a pass reports zero or more [`Finding`]s. The runner orders
//! them by [`Check`] and folds their messages into one [`ValidationError`].

use std::fmt;

use strata_common::Error;
use thiserror::Error as ThisError;

/// The checks of a preflight pass, in report order
///
/// The derived ordering is the order findings appear in the composite error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Check {
    /// Control plane machines are ready and up to date
    ControlPlaneReady,
    /// Worker machines are ready
    WorkerReady,
    /// Every node reports Ready
    NodeReady,
    /// The clusters CRD is installed
    CrdPresent,
    /// Exactly one CAPI cluster object matches the cluster name
    ClusterExists,
    /// Control plane minor version skew
    VersionSkew,
    /// Worker node group version skew
    WorkerVersionSkew,
    /// The desired version is offered by the release manifest
    KubernetesSupport,
    /// Git credentials for generic git providers
    GitAuthentication,
    /// Core immutable fields (cluster, identity providers, GitOps, Flux)
    ImmutableFields,
    /// Provider datacenter and machine configs
    ProviderSpec,
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ControlPlaneReady => "control-plane-ready",
            Self::WorkerReady => "worker-ready",
            Self::NodeReady => "node-ready",
            Self::CrdPresent => "crd-present",
            Self::ClusterExists => "cluster-exists",
            Self::VersionSkew => "version-skew",
            Self::WorkerVersionSkew => "worker-version-skew",
            Self::KubernetesSupport => "kubernetes-support",
            Self::GitAuthentication => "git-authentication",
            Self::ImmutableFields => "immutable-fields",
            Self::ProviderSpec => "provider-spec",
        };
        f.write_str(name)
    }
}

/// What kind of problem a finding describes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FindingKind {
    /// Control plane, worker or node not ready
    ReadinessViolation,
    /// A required object or CRD is absent or unreadable
    MissingResource,
    /// Zero, non-matching or several CAPI cluster objects
    AmbiguousOrMissingCluster,
    /// Minor version skew exceeds policy
    VersionSkewViolation,
    /// The desired version is not offered by the release
    UnsupportedVersion,
    /// Credentials needed to reach the GitOps repository are unusable
    AuthenticationFailure,
    /// A policy-protected field changed
    ImmutableFieldViolation,
    /// A provider config is internally inconsistent
    InvalidProviderSpec,
}

/// One problem discovered by a preflight pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Finding {
    /// The check that produced the finding
    pub check: Check,
    /// Problem category
    pub kind: FindingKind,
    /// Rendered, user-facing message
    pub message: String,
}

impl Finding {
    /// Create a finding
    pub fn new(check: Check, kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            check,
            kind,
            message: message.into(),
        }
    }

    /// Downgrade a non-fatal error to a finding carrying its display form
    pub fn from_error(check: Check, kind: FindingKind, err: &Error) -> Self {
        Self::new(check, kind, err.to_string())
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Order findings by check, keeping each check's own order
pub fn aggregate(mut findings: Vec<Finding>) -> Vec<Finding> {
    findings.sort_by_key(|f| f.check);
    findings
}

/// The ordered messages of every finding from one pass
///
/// Two composites are equal when their message lists are equal.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("{}", render(.errs))]
pub struct ValidationError {
    /// Finding messages in report order
    pub errs: Vec<String>,
}

impl ValidationError {
    /// Create a composite from messages
    pub fn new<I, S>(errs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            errs: errs.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a composite from ordered findings; `None` when there are none
    pub fn from_findings(findings: &[Finding]) -> Option<Self> {
        if findings.is_empty() {
            return None;
        }
        Some(Self::new(findings.iter().map(|f| f.message.clone())))
    }

    /// Number of findings
    pub fn len(&self) -> usize {
        self.errs.len()
    }

    /// Whether the composite holds no findings
    pub fn is_empty(&self) -> bool {
        self.errs.is_empty()
    }
}

fn render(errs: &[String]) -> String {
    let mut out = format!("validation failed with {} error(s):", errs.len());
    for err in errs {
        out.push_str("\n- ");
        out.push_str(err);
    }
    out
}
