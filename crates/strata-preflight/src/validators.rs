//! Cluster state validators
//!
//! Each validator turns one observation into zero or more findings. Fatal
//! errors from the client are returned as `Err` and abort the pass; every
//! other error is a statement about the cluster and becomes a finding.

use std::path::Path;

use strata_common::version::{parse_kube_version, KubeVersion};
use strata_common::{ClusterConfig, Error, Result};
use tracing::debug;

use crate::client::CapiClusterRef;
use crate::config::GitCredentials;
use crate::finding::{Check, Finding, FindingKind};

/// Largest allowed minor version step in one upgrade
pub const MAX_MINOR_SKEW: u64 = 1;

/// Largest allowed lag of a worker group behind the control plane
pub const MAX_WORKER_LAG: u64 = 2;

/// Downgrade a readiness result to a finding, propagating fatal errors
pub fn readiness_finding(check: Check, kind: FindingKind, result: Result<()>) -> Result<Option<Finding>> {
    match result {
        Ok(()) => Ok(None),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            debug!(check = %check, error = %e, "check failed");
            Ok(Some(Finding::from_error(check, kind, &e)))
        }
    }
}

fn cluster_finding(message: String) -> Finding {
    Finding::new(
        Check::ClusterExists,
        FindingKind::AmbiguousOrMissingCluster,
        message,
    )
}

/// Exactly one CAPI cluster object must carry the cluster's name
pub fn validate_cluster_exists(clusters: &[CapiClusterRef], cluster_name: &str) -> Option<Finding> {
    if clusters.is_empty() {
        return Some(cluster_finding(format!(
            "no CAPI cluster objects present on workload cluster {cluster_name}"
        )));
    }
    match clusters.iter().filter(|c| c.name == cluster_name).count() {
        0 => Some(cluster_finding(format!(
            "couldn't find CAPI cluster object for cluster with name {cluster_name}"
        ))),
        1 => None,
        n => Some(cluster_finding(format!(
            "found {n} CAPI cluster objects for cluster with name {cluster_name}"
        ))),
    }
}

fn skew_finding(check: Check, message: String) -> Finding {
    Finding::new(check, FindingKind::VersionSkewViolation, message)
}

fn parse_or_finding(check: Check, version: &str) -> std::result::Result<KubeVersion, Finding> {
    parse_kube_version(version).map_err(|e| skew_finding(check, e.to_string()))
}

/// The control plane may move at most one minor version per upgrade
pub fn validate_version_skew(existing: &ClusterConfig, desired: &ClusterConfig) -> Option<Finding> {
    let desired_version = desired.kubernetes_version();
    let new = match parse_or_finding(Check::VersionSkew, desired_version) {
        Ok(v) => v,
        Err(finding) => return Some(finding),
    };
    let old = match parse_or_finding(Check::VersionSkew, existing.kubernetes_version()) {
        Ok(v) => v,
        Err(finding) => return Some(finding),
    };

    let skew = old.minor_skew(&new);
    if skew > MAX_MINOR_SKEW {
        return Some(skew_finding(
            Check::VersionSkew,
            format!(
                "spec: Invalid value: \"{desired_version}\": only +1 minor version skew is supported, minor version skew detected {skew}"
            ),
        ));
    }
    None
}

/// Worker node groups with an explicit version must stay within policy
///
/// A group may not run ahead of the control plane, may lag it by at most
/// [`MAX_WORKER_LAG`] minors and may move at most [`MAX_MINOR_SKEW`] minor
/// from its current version.
pub fn validate_worker_version_skew(existing: &ClusterConfig, desired: &ClusterConfig) -> Vec<Finding> {
    let check = Check::WorkerVersionSkew;
    let control_plane = match parse_kube_version(desired.kubernetes_version()) {
        Ok(v) => v,
        // Reported by the control plane skew check
        Err(_) => return Vec::new(),
    };

    let mut findings = Vec::new();
    for group in &desired.cluster.spec.worker_node_group_configurations {
        let Some(version) = group.kubernetes_version.as_deref() else {
            continue;
        };
        let new = match parse_or_finding(check, version) {
            Ok(v) => v,
            Err(finding) => {
                findings.push(finding);
                continue;
            }
        };

        if new > control_plane {
            findings.push(skew_finding(
                check,
                format!(
                    "worker node group {} kubernetes version {new} cannot be greater than control plane version {control_plane}",
                    group.name
                ),
            ));
        } else if control_plane.minor_skew(&new) > MAX_WORKER_LAG {
            findings.push(skew_finding(
                check,
                format!(
                    "worker node group {} kubernetes version {new} cannot be more than {MAX_WORKER_LAG} minor versions behind control plane version {control_plane}",
                    group.name
                ),
            ));
        }

        let current = existing
            .cluster
            .spec
            .worker_node_group_configurations
            .iter()
            .find(|g| g.name == group.name)
            .map(|g| {
                g.kubernetes_version
                    .as_deref()
                    .unwrap_or(existing.kubernetes_version())
            });
        if let Some(Ok(old)) = current.map(parse_kube_version) {
            let skew = old.minor_skew(&new);
            if skew > MAX_MINOR_SKEW {
                findings.push(skew_finding(
                    check,
                    format!(
                        "worker node group {}: only +1 minor version skew is supported, minor version skew detected {skew}",
                        group.name
                    ),
                ));
            }
        }
    }
    findings
}

/// The desired version must be offered by the release
pub fn validate_kubernetes_support(supported: &[String], desired: &ClusterConfig) -> Option<Finding> {
    let version = desired.kubernetes_version();
    let wanted = match parse_kube_version(version) {
        Ok(v) => v,
        Err(_) => return None,
    };
    let offered = supported
        .iter()
        .filter_map(|v| parse_kube_version(v).ok())
        .any(|v| v == wanted);
    if offered {
        return None;
    }
    Some(Finding::new(
        Check::KubernetesSupport,
        FindingKind::UnsupportedVersion,
        format!("kubernetes version {version} is not supported by this release"),
    ))
}

async fn check_credential_file(label: &str, path: Option<&Path>) -> Option<String> {
    let Some(path) = path else {
        return Some(format!("{label} is required for the git provider"));
    };
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.is_file() && meta.len() > 0 => None,
        Ok(meta) if meta.is_file() => Some(format!("{label} {} is empty", path.display())),
        Ok(_) => Some(format!("{label} {} is not a file", path.display())),
        Err(e) => Some(format!("unable to read {label} {}: {e}", path.display())),
    }
}

/// Generic git providers need a usable private key and known-hosts file
pub async fn validate_git_authentication(
    desired: &ClusterConfig,
    credentials: Option<&GitCredentials>,
) -> Vec<Finding> {
    let uses_git = desired
        .flux_config
        .as_ref()
        .is_some_and(|f| f.spec.git.is_some());
    if !uses_git {
        return Vec::new();
    }

    let (key, known_hosts) = match credentials {
        Some(c) => (c.private_key_file.as_deref(), c.known_hosts_file.as_deref()),
        None => (None, None),
    };

    let mut messages = Vec::new();
    messages.extend(check_credential_file("git private key file", key).await);
    messages.extend(check_credential_file("git known hosts file", known_hosts).await);

    messages
        .into_iter()
        .map(|m| {
            Finding::new(
                Check::GitAuthentication,
                FindingKind::AuthenticationFailure,
                m,
            )
        })
        .collect()
}

/// Interpret the result of reading an object that may legitimately be absent
///
/// `NotFound` yields `None`. Fatal errors propagate. Any other failure is
/// recorded as a finding under `check` and yields `None`.
pub fn optional_object<T>(
    result: Result<T>,
    check: Check,
    kind: &str,
    name: &str,
    findings: &mut Vec<Finding>,
) -> Result<Option<T>> {
    match result {
        Ok(obj) => Ok(Some(obj)),
        Err(Error::NotFound { .. }) => {
            debug!(kind, name, "object not found");
            Ok(None)
        }
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            findings.push(Finding::new(
                check,
                FindingKind::MissingResource,
                format!("unable to read {kind} {name}: {e}"),
            ));
            Ok(None)
        }
    }
}

/// Downgrade the failure to read the existing cluster to a finding
pub fn existing_cluster_finding(cluster_name: &str, err: &Error) -> Finding {
    Finding::new(
        Check::VersionSkew,
        FindingKind::MissingResource,
        format!("unable to read existing cluster {cluster_name}: {err}"),
    )
}
