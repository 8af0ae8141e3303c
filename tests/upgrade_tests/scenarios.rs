//! Stories about upgrades checked by `strata preflight`
//!
//! Each story sets up a cluster running one configuration, asks for an
//! upgrade to another and checks exactly what the operator is told.

use std::sync::Arc;

use strata::commands::preflight::{execute, render, PreflightArgs, PASSED_MESSAGE};
use strata_common::ClusterConfig;
use strata_preflight::{ClusterClient, PreflightConfig, PreflightReport};
use tokio_util::sync::CancellationToken;

use super::fake_cluster::FakeCluster;
use super::fixtures::{vsphere_with_oidc, write_config, BareMetal};

// =============================================================================
// Helpers
// =============================================================================

async fn preflight_with(
    cluster: Arc<FakeCluster>,
    desired_yaml: &str,
    cancel: &CancellationToken,
) -> strata::Result<PreflightReport> {
    let file = write_config(desired_yaml);
    let args = PreflightArgs {
        cluster_config: file.path().to_path_buf(),
        ..Default::default()
    };
    let client: Arc<dyn ClusterClient> = cluster;
    execute(&args, client, PreflightConfig::default(), cancel).await
}

async fn messages(cluster: FakeCluster, desired_yaml: &str) -> Vec<String> {
    preflight_with(Arc::new(cluster), desired_yaml, &CancellationToken::new())
        .await
        .unwrap()
        .findings
        .into_iter()
        .map(|f| f.message)
        .collect()
}

fn bare_metal(version: &'static str) -> BareMetal {
    BareMetal {
        kubernetes_version: version,
        ..Default::default()
    }
}

fn managed_by(yaml: &str, management: &str) -> String {
    yaml.replacen(
        "spec:\n  kubernetesVersion",
        &format!("spec:\n  managementCluster:\n    name: {management}\n  kubernetesVersion"),
        1,
    )
}

// =============================================================================
// Story Tests: Upgrades That May Proceed
// =============================================================================

/// Story: a healthy bare-metal cluster moves up one minor version
///
/// The OS image changes with the version; that field is mutable, so the
/// operator is told the upgrade may proceed.
#[tokio::test]
async fn story_bare_metal_minor_upgrade_passes() {
    let cluster = Arc::new(FakeCluster::healthy(bare_metal("1.29").config()));
    let report = preflight_with(cluster, &BareMetal::default().yaml(), &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(render(&report), PASSED_MESSAGE);
}

/// Story: listing the same identity providers in another order is not a change
#[tokio::test]
async fn story_reordered_identity_providers_pass() {
    let existing = ClusterConfig::from_yaml(&vsphere_with_oidc(["oidc-corp", "oidc-partner"])).unwrap();
    let desired = vsphere_with_oidc(["oidc-partner", "oidc-corp"]);

    assert!(messages(FakeCluster::healthy(existing), &desired).await.is_empty());
}

// =============================================================================
// Story Tests: Upgrades That Are Rejected
// =============================================================================

/// Story: skipping a minor version is rejected with the exact skew
#[tokio::test]
async fn story_two_minor_jump_is_rejected() {
    let cluster = FakeCluster::healthy(bare_metal("1.28").config());

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec!["spec: Invalid value: \"1.30\": only +1 minor version skew is supported, minor version skew detected 2"]
    );
}

/// Story: an unhealthy cluster reports every problem at once, in check order
#[tokio::test]
async fn story_unhealthy_cluster_reports_everything() {
    let mut cluster = FakeCluster::healthy(bare_metal("1.28").config());
    cluster.control_plane_ready = false;
    cluster.unready_workers = 2;
    cluster.unready_nodes = vec![("prod-cp-7xk2p".to_string(), "Unknown".to_string())];
    cluster.crd_installed = false;
    cluster.capi_clusters = vec!["staging".to_string()];

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec![
            "control plane nodes are not ready",
            "2 worker nodes are not ready",
            "node prod-cp-7xk2p is not ready, currently in Unknown state",
            "error getting clusters crd: crd not found",
            "couldn't find CAPI cluster object for cluster with name prod",
            "spec: Invalid value: \"1.30\": only +1 minor version skew is supported, minor version skew detected 2",
        ]
    );
}

/// Story: moving the API server endpoint would orphan every node
#[tokio::test]
async fn story_moving_the_endpoint_is_rejected() {
    let existing = BareMetal {
        endpoint: "10.80.0.99",
        ..Default::default()
    };
    let cluster = FakeCluster::healthy(existing.config());

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec!["spec.controlPlaneConfiguration.endpoint is immutable"]
    );
}

/// Story: machines cannot be moved onto different hardware in place
#[tokio::test]
async fn story_hardware_selector_change_is_rejected() {
    let existing = BareMetal {
        control_plane_selector: "cp-old",
        ..Default::default()
    };
    let cluster = FakeCluster::healthy(existing.config());

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec!["spec.HardwareSelector is immutable. Previous value map[type:cp-old], New value map[type:cp]"]
    );
}

/// Story: findings from different checks come out in a fixed order
#[tokio::test]
async fn story_findings_follow_check_order() {
    let existing = BareMetal {
        endpoint: "10.80.0.99",
        tinkerbell_ip: "10.80.0.21",
        ..Default::default()
    };
    let mut cluster = FakeCluster::healthy(existing.config());
    cluster.unready_nodes = vec![("prod-worker-q8m4d".to_string(), "False".to_string())];

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec![
            "node prod-worker-q8m4d is not ready, currently in False state",
            "spec.controlPlaneConfiguration.endpoint is immutable",
            "spec.tinkerbellIP is immutable; previous = 10.80.0.21, new = 10.80.0.20",
        ]
    );
}

// =============================================================================
// Degraded and Aborted Passes
// =============================================================================

#[tokio::test]
async fn test_missing_cluster_object_is_reported() {
    let mut cluster = FakeCluster::healthy(bare_metal("1.29").config());
    cluster.existing = None;

    assert_eq!(
        messages(cluster, &BareMetal::default().yaml()).await,
        vec!["unable to read existing cluster prod: Cluster prod not found"]
    );
}

#[tokio::test]
async fn test_checks_query_the_right_cluster() {
    let existing = managed_by(&bare_metal("1.29").yaml(), "mgmt");
    let cluster = Arc::new(FakeCluster::healthy(ClusterConfig::from_yaml(&existing).unwrap()));
    let desired = managed_by(&BareMetal::default().yaml(), "mgmt");

    let report = preflight_with(cluster.clone(), &desired, &CancellationToken::new())
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(cluster.targets_of("validate_nodes"), vec!["prod"]);
    for call in ["get_cluster", "get_clusters", "validate_control_plane_nodes", "get_machine_config"] {
        assert_eq!(cluster.targets_of(call), vec!["mgmt"], "{call}");
    }
}

#[tokio::test]
async fn test_unreachable_cluster_aborts_pass() {
    let mut cluster = FakeCluster::healthy(bare_metal("1.29").config());
    cluster.unreachable = true;

    let result = preflight_with(Arc::new(cluster), &BareMetal::default().yaml(), &CancellationToken::new()).await;
    match result {
        Err(strata::Error::Strata(e)) => assert!(e.is_fatal()),
        other => panic!("expected a fatal error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancelled_pass_produces_no_report() {
    let cluster = Arc::new(FakeCluster::healthy(bare_metal("1.29").config()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = preflight_with(cluster, &BareMetal::default().yaml(), &cancel)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "preflight validation was cancelled");
}

#[tokio::test]
async fn test_repeated_passes_agree() {
    let existing = BareMetal {
        kubernetes_version: "1.27",
        control_plane_selector: "cp-old",
        ..Default::default()
    };
    let cluster = Arc::new(FakeCluster::healthy(existing.config()));
    let desired = BareMetal::default().yaml();
    let cancel = CancellationToken::new();

    let first = preflight_with(cluster.clone(), &desired, &cancel).await.unwrap();
    let second = preflight_with(cluster, &desired, &cancel).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.findings.len(), 2);
}
