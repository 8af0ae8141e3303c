//! Preflight pass orchestration
//!
//! A pass gathers every observation it needs concurrently, then evaluates the
//! pure checks and orders all findings by check. Every check is isolated: a
//! failing check contributes findings and the pass continues. Only fatal
//! errors (cancellation, deadline, internal failures) abort a pass.

use std::sync::Arc;

use futures::future::join_all;
use strata_common::crd::{
    AWSIamConfig, FluxConfig, GitOpsConfig, OIDCConfig, AWS_IAM_CONFIG_KIND, FLUX_CONFIG_KIND,
    GITOPS_CONFIG_KIND, OIDC_CONFIG_KIND,
};
use strata_common::{ClusterConfig, Error, Result};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::client::{ClusterClient, TargetCluster};
use crate::config::PreflightConfig;
use crate::finding::{aggregate, Check, Finding, FindingKind, ValidationError};
use crate::immutability::validate_immutable_fields;
use crate::provider::ProviderAdapter;
use crate::release::ReleaseReader;
use crate::validators::{
    existing_cluster_finding, optional_object, readiness_finding, validate_cluster_exists,
    validate_git_authentication, validate_kubernetes_support, validate_version_skew,
    validate_worker_version_skew,
};

const OPERATION: &str = "preflight validation";

/// Everything one preflight pass needs
pub struct PreflightOptions {
    /// Client for reading cluster state
    pub client: Arc<dyn ClusterClient>,
    /// Adapter for the desired cluster's provider family
    pub provider: Arc<dyn ProviderAdapter>,
    /// Release metadata; the version support check is skipped without it
    pub release_reader: Option<Arc<dyn ReleaseReader>>,
    /// Cluster being upgraded, queried for node readiness
    pub workload_cluster: TargetCluster,
    /// Cluster holding the CAPI and cluster objects
    pub management_cluster: TargetCluster,
    /// The configuration the cluster is being upgraded to
    pub desired: ClusterConfig,
    /// Deadline and credentials
    pub config: PreflightConfig,
}

/// Outcome of a completed pass
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreflightReport {
    /// Findings in check order
    pub findings: Vec<Finding>,
}

impl PreflightReport {
    /// Whether the upgrade may proceed
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    /// Finding messages in report order
    pub fn messages(&self) -> Vec<&str> {
        self.findings.iter().map(|f| f.message.as_str()).collect()
    }

    /// The composite error, or `None` when the pass found nothing
    pub fn into_error(self) -> Option<ValidationError> {
        ValidationError::from_findings(&self.findings)
    }
}

/// Existing configuration read back from the management cluster
enum ExistingState {
    /// The cluster object was read; attached configs may have produced findings
    Fetched(Box<ClusterConfig>, Vec<Finding>),
    /// The cluster object could not be read
    Unavailable(Finding),
}

/// Runs preflight passes for one desired configuration
pub struct PreflightRunner {
    opts: PreflightOptions,
}

impl PreflightRunner {
    /// Create a runner
    pub fn new(opts: PreflightOptions) -> Self {
        Self { opts }
    }

    /// Run one pass
    ///
    /// Returns the report when every check ran to completion. Cancellation,
    /// an expired deadline or a fatal client error abort the pass and are
    /// returned as `Err`; no partial report is produced.
    #[instrument(skip_all, fields(cluster = %self.opts.desired.cluster_name()))]
    pub async fn run(&self, cancel: &CancellationToken) -> Result<PreflightReport> {
        info!(
            workload = %self.opts.workload_cluster.name,
            management = %self.opts.management_cluster.name,
            "starting preflight validation"
        );

        let pass = self.run_pass();
        let bounded = async {
            match self.opts.config.timeout {
                Some(after) => match tokio::time::timeout(after, pass).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::timeout(OPERATION, after)),
                },
                None => pass.await,
            }
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled(OPERATION)),
            result = bounded => result,
        };

        match &result {
            Ok(report) => info!(findings = report.findings.len(), "preflight validation finished"),
            Err(e) => warn!(error = %e, "preflight validation aborted"),
        }
        result
    }

    async fn run_pass(&self) -> Result<PreflightReport> {
        let opts = &self.opts;
        let client = opts.client.as_ref();
        let workload = &opts.workload_cluster;
        let management = &opts.management_cluster;
        let name = opts.desired.cluster_name();

        // =====================================================================
        // Phase 1: observe
        // =====================================================================
        let (control_plane, workers, nodes, crd, exists, existing, provider, support, git) = tokio::try_join!(
            async {
                readiness_finding(
                    Check::ControlPlaneReady,
                    FindingKind::ReadinessViolation,
                    client.validate_control_plane_nodes(management, &name).await,
                )
            },
            async {
                readiness_finding(
                    Check::WorkerReady,
                    FindingKind::ReadinessViolation,
                    client.validate_worker_nodes(management, &name).await,
                )
            },
            async {
                readiness_finding(
                    Check::NodeReady,
                    FindingKind::ReadinessViolation,
                    client.validate_nodes(workload).await,
                )
            },
            async {
                readiness_finding(
                    Check::CrdPresent,
                    FindingKind::MissingResource,
                    client.validate_clusters_crd(management).await,
                )
            },
            self.check_cluster_exists(&name),
            self.fetch_existing(&name),
            self.check_provider(),
            self.check_kubernetes_support(),
            async {
                Ok::<_, Error>(
                    validate_git_authentication(&opts.desired, opts.config.git_credentials.as_ref())
                        .await,
                )
            },
        )?;

        // =====================================================================
        // Phase 2: evaluate
        // =====================================================================
        let mut findings: Vec<Finding> = [control_plane, workers, nodes, crd, exists]
            .into_iter()
            .flatten()
            .collect();

        match existing {
            ExistingState::Fetched(existing, read_findings) => {
                findings.extend(validate_version_skew(&existing, &opts.desired));
                findings.extend(validate_worker_version_skew(&existing, &opts.desired));
                findings.extend(read_findings);
                match validate_immutable_fields(&existing, &opts.desired) {
                    Ok(violations) => findings.extend(violations),
                    Err(e) if e.is_fatal() => return Err(e),
                    Err(e) => findings.push(Finding::from_error(
                        Check::ImmutableFields,
                        FindingKind::ImmutableFieldViolation,
                        &e,
                    )),
                }
            }
            ExistingState::Unavailable(finding) => findings.push(finding),
        }

        findings.extend(support);
        findings.extend(git);
        findings.extend(provider);

        Ok(PreflightReport {
            findings: aggregate(findings),
        })
    }

    async fn check_cluster_exists(&self, name: &str) -> Result<Option<Finding>> {
        match self.opts.client.get_clusters(&self.opts.management_cluster).await {
            Ok(clusters) => Ok(validate_cluster_exists(&clusters, name)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(Some(Finding::from_error(
                Check::ClusterExists,
                FindingKind::MissingResource,
                &e,
            ))),
        }
    }

    async fn check_provider(&self) -> Result<Vec<Finding>> {
        let provider = self.opts.provider.as_ref();
        match provider
            .validate_new_spec(&self.opts.management_cluster, &self.opts.desired)
            .await
        {
            Ok(findings) => Ok(findings),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(vec![Finding::from_error(
                Check::ProviderSpec,
                FindingKind::InvalidProviderSpec,
                &e,
            )]),
        }
    }

    async fn check_kubernetes_support(&self) -> Result<Option<Finding>> {
        let Some(reader) = &self.opts.release_reader else {
            debug!("no release metadata, skipping kubernetes version support check");
            return Ok(None);
        };
        match reader.supported_kube_versions().await {
            Ok(supported) => Ok(validate_kubernetes_support(&supported, &self.opts.desired)),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => Ok(Some(Finding::from_error(
                Check::KubernetesSupport,
                FindingKind::UnsupportedVersion,
                &e,
            ))),
        }
    }

    /// Read the running cluster and the configs it references
    ///
    /// Attached configs are looked up by the existing cluster's own refs.
    /// Datacenter and machine configs are read by the provider adapter.
    async fn fetch_existing(&self, name: &str) -> Result<ExistingState> {
        let client = self.opts.client.as_ref();
        let target = &self.opts.management_cluster;
        let namespace = self.opts.desired.namespace();

        let cluster = match client.get_cluster(target, &namespace, name).await {
            Ok(cluster) => cluster,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => return Ok(ExistingState::Unavailable(existing_cluster_finding(name, &e))),
        };

        let aws_iam_name = cluster.aws_iam_refs().first().map(|r| r.name.clone());
        let oidc_names: Vec<String> = cluster.oidc_refs().iter().map(|r| r.name.clone()).collect();
        let gitops_ref = cluster.spec.git_ops_ref.clone();
        let gitops_name = gitops_ref
            .as_ref()
            .filter(|r| r.kind == GITOPS_CONFIG_KIND)
            .map(|r| r.name.clone());
        let flux_name = gitops_ref
            .as_ref()
            .filter(|r| r.kind == FLUX_CONFIG_KIND)
            .map(|r| r.name.clone());

        let (aws_iam, oidc, gitops, flux) = tokio::join!(
            async {
                match &aws_iam_name {
                    Some(n) => Some(client.get_aws_iam_config(target, &namespace, n).await),
                    None => None,
                }
            },
            join_all(
                oidc_names
                    .iter()
                    .map(|n| client.get_oidc_config(target, &namespace, n))
            ),
            async {
                match &gitops_name {
                    Some(n) => Some(client.get_gitops_config(target, &namespace, n).await),
                    None => None,
                }
            },
            async {
                match &flux_name {
                    Some(n) => Some(client.get_flux_config(target, &namespace, n).await),
                    None => None,
                }
            },
        );

        let mut findings = Vec::new();
        let mut existing = ClusterConfig::new(cluster);
        existing.aws_iam_config =
            attached::<AWSIamConfig>(aws_iam, AWS_IAM_CONFIG_KIND, aws_iam_name.as_deref(), &mut findings)?;
        for (config_name, result) in oidc_names.iter().zip(oidc) {
            let config = attached::<OIDCConfig>(
                Some(result),
                OIDC_CONFIG_KIND,
                Some(config_name),
                &mut findings,
            )?;
            if let Some(config) = config {
                existing.oidc_configs.insert(config_name.clone(), config);
            }
        }
        existing.gitops_config =
            attached::<GitOpsConfig>(gitops, GITOPS_CONFIG_KIND, gitops_name.as_deref(), &mut findings)?;
        existing.flux_config =
            attached::<FluxConfig>(flux, FLUX_CONFIG_KIND, flux_name.as_deref(), &mut findings)?;

        debug!(
            oidc = existing.oidc_configs.len(),
            aws_iam = existing.aws_iam_config.is_some(),
            gitops = existing.gitops_config.is_some(),
            flux = existing.flux_config.is_some(),
            "read existing cluster"
        );
        Ok(ExistingState::Fetched(Box::new(existing), findings))
    }
}

fn attached<T>(
    result: Option<Result<T>>,
    kind: &str,
    name: Option<&str>,
    findings: &mut Vec<Finding>,
) -> Result<Option<T>> {
    match (result, name) {
        (Some(result), Some(name)) => {
            optional_object(result, Check::ImmutableFields, kind, name, findings)
        }
        _ => Ok(None),
    }
}

/// Run one pass and fold its findings into a composite error
///
/// `Ok(None)` means the upgrade may proceed. `Ok(Some(_))` lists every
/// problem found. `Err` means the pass was aborted.
pub async fn run_preflight_validations(
    opts: PreflightOptions,
    cancel: &CancellationToken,
) -> Result<Option<ValidationError>> {
    let report = PreflightRunner::new(opts).run(cancel).await?;
    Ok(report.into_error())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use strata_common::crd::{
        Cluster, ClusterSpec, ControlPlaneConfiguration, DatacenterConfig, DatacenterKind,
        Endpoint, MachineConfig, OIDCConfigSpec, Ref, WorkerNodeGroupConfiguration,
    };
    use tokio::sync::Notify;

    use super::*;
    use crate::client::{CapiClusterRef, MockClusterClient};
    use crate::provider::MockProviderAdapter;
    use crate::release::MockReleaseReader;

    fn cluster_config(version: &str) -> ClusterConfig {
        let mut cluster = Cluster::new(
            "testcluster",
            ClusterSpec {
                kubernetes_version: version.to_string(),
                control_plane_configuration: ControlPlaneConfiguration {
                    count: 1,
                    endpoint: Some(Endpoint {
                        host: "1.1.1.1".to_string(),
                    }),
                    machine_group_ref: Some(Ref::new("VSphereMachineConfig", "testcluster-cp")),
                    kubelet_configuration: None,
                },
                worker_node_group_configurations: vec![WorkerNodeGroupConfiguration {
                    name: "md-0".to_string(),
                    count: Some(1),
                    machine_group_ref: Some(Ref::new("VSphereMachineConfig", "testcluster-worker")),
                    ..Default::default()
                }],
                datacenter_ref: Ref::new("VSphereDatacenterConfig", "testcluster"),
                ..Default::default()
            },
        );
        cluster.metadata.namespace = Some("default".to_string());
        ClusterConfig::new(cluster)
    }

    /// Canned cluster state for a mock client
    struct Fixture {
        clusters: Vec<&'static str>,
        existing: Option<ClusterConfig>,
        control_plane: Option<&'static str>,
        workers: Option<&'static str>,
        nodes: Option<&'static str>,
        crd: Option<&'static str>,
        clusters_fatal: bool,
    }

    impl Fixture {
        fn healthy(existing: ClusterConfig) -> Self {
            Self {
                clusters: vec!["testcluster"],
                existing: Some(existing),
                control_plane: None,
                workers: None,
                nodes: None,
                crd: None,
                clusters_fatal: false,
            }
        }

        fn client(self) -> MockClusterClient {
            let mut client = MockClusterClient::new();

            let clusters = self.clusters;
            let fatal = self.clusters_fatal;
            client.expect_get_clusters().returning(move |_| {
                if fatal {
                    return Err(Error::internal("connection to api server lost"));
                }
                Ok(clusters.iter().map(|n| CapiClusterRef::new(*n)).collect())
            });

            let existing = self.existing;
            let cluster = existing.as_ref().map(|e| e.cluster.clone());
            client
                .expect_get_cluster()
                .returning(move |_, _, name| cluster.clone().ok_or_else(|| Error::not_found("Cluster", name)));
            let oidc = existing.as_ref().map(|e| e.oidc_configs.clone()).unwrap_or_default();
            client.expect_get_oidc_config().returning(move |_, _, name| {
                oidc.get(name)
                    .cloned()
                    .ok_or_else(|| Error::not_found(OIDC_CONFIG_KIND, name))
            });
            let aws = existing.as_ref().and_then(|e| e.aws_iam_config.clone());
            client
                .expect_get_aws_iam_config()
                .returning(move |_, _, name| aws.clone().ok_or_else(|| Error::not_found(AWS_IAM_CONFIG_KIND, name)));
            client
                .expect_get_gitops_config()
                .returning(|_, _, name| Err(Error::not_found(GITOPS_CONFIG_KIND, name)));
            client
                .expect_get_flux_config()
                .returning(|_, _, name| Err(Error::not_found(FLUX_CONFIG_KIND, name)));

            let readiness = |failure: Option<&'static str>| match failure {
                Some(msg) => Err(Error::not_ready(msg)),
                None => Ok(()),
            };
            let cp = self.control_plane;
            client
                .expect_validate_control_plane_nodes()
                .returning(move |_, _| readiness(cp));
            let workers = self.workers;
            client
                .expect_validate_worker_nodes()
                .returning(move |_, _| readiness(workers));
            let nodes = self.nodes;
            client.expect_validate_nodes().returning(move |_| readiness(nodes));
            let crd = self.crd;
            client
                .expect_validate_clusters_crd()
                .returning(move |_| readiness(crd));
            client
        }
    }

    fn provider(findings: Vec<Finding>) -> MockProviderAdapter {
        let mut provider = MockProviderAdapter::new();
        provider
            .expect_validate_new_spec()
            .returning(move |_, _| Ok(findings.clone()));
        provider
    }

    fn options(client: MockClusterClient, provider: MockProviderAdapter, desired: ClusterConfig) -> PreflightOptions {
        PreflightOptions {
            client: Arc::new(client),
            provider: Arc::new(provider),
            release_reader: None,
            workload_cluster: TargetCluster::new("testcluster", None),
            management_cluster: TargetCluster::new("mgmt", None),
            desired,
            config: PreflightConfig::default(),
        }
    }

    async fn run(opts: PreflightOptions) -> Vec<String> {
        PreflightRunner::new(opts)
            .run(&CancellationToken::new())
            .await
            .unwrap()
            .findings
            .into_iter()
            .map(|f| f.message)
            .collect()
    }

    // =========================================================================
    // Story Tests: Upgrade Gates
    // =========================================================================

    /// Story: a healthy cluster moving one minor version passes
    #[tokio::test]
    async fn story_healthy_minor_upgrade_passes() {
        let client = Fixture::healthy(cluster_config("1.29")).client();
        let opts = options(client, provider(Vec::new()), cluster_config("1.30"));
        let result = run_preflight_validations(opts, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_none());
    }

    /// Story: a broken cluster reports every problem at once, in check order
    #[tokio::test]
    async fn story_everything_broken_reports_in_check_order() {
        let mut fixture = Fixture::healthy(cluster_config("1.28"));
        fixture.clusters = vec!["othercluster"];
        fixture.control_plane = Some("control plane nodes are not ready");
        fixture.workers = Some("2 worker nodes are not ready");
        fixture.nodes = Some("node ip-10-0-0-1 is not ready, currently in Unknown state");
        fixture.crd = Some("error getting clusters crd: crd not found");
        let opts = options(fixture.client(), provider(Vec::new()), cluster_config("1.30"));

        let err = run_preflight_validations(opts, &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            err.errs,
            vec![
                "control plane nodes are not ready",
                "2 worker nodes are not ready",
                "node ip-10-0-0-1 is not ready, currently in Unknown state",
                "error getting clusters crd: crd not found",
                "couldn't find CAPI cluster object for cluster with name testcluster",
                "spec: Invalid value: \"1.30\": only +1 minor version skew is supported, minor version skew detected 2",
            ]
        );
    }

    /// Story: a moved endpoint is rejected alongside provider findings
    #[tokio::test]
    async fn story_immutable_change_precedes_provider_findings() {
        let existing = cluster_config("1.29");
        let mut desired = cluster_config("1.30");
        desired
            .cluster
            .spec
            .control_plane_configuration
            .endpoint = Some(Endpoint {
            host: "2.3.4.5".to_string(),
        });
        let provider_finding = Finding::new(
            Check::ProviderSpec,
            FindingKind::ImmutableFieldViolation,
            "spec.server is immutable",
        );
        let opts = options(
            Fixture::healthy(existing).client(),
            provider(vec![provider_finding]),
            desired,
        );

        assert_eq!(
            run(opts).await,
            vec![
                "spec.controlPlaneConfiguration.endpoint is immutable",
                "spec.server is immutable",
            ]
        );
    }

    /// Story: reordering identity providers is not a change
    #[tokio::test]
    async fn story_identity_provider_reorder_passes() {
        let mut existing = cluster_config("1.30");
        existing.cluster.spec.identity_provider_refs = vec![
            Ref::new(OIDC_CONFIG_KIND, "oidc-a"),
            Ref::new(OIDC_CONFIG_KIND, "oidc-b"),
        ];
        for name in ["oidc-a", "oidc-b"] {
            existing.oidc_configs.insert(
                name.to_string(),
                OIDCConfig::new(
                    name,
                    OIDCConfigSpec {
                        client_id: name.to_string(),
                        issuer_url: "https://issuer".to_string(),
                        ..Default::default()
                    },
                ),
            );
        }
        let mut desired = existing.clone();
        desired.cluster.spec.identity_provider_refs.reverse();

        let opts = options(Fixture::healthy(existing).client(), provider(Vec::new()), desired);
        assert!(run(opts).await.is_empty());
    }

    // =========================================================================
    // Degraded Observations
    // =========================================================================

    #[tokio::test]
    async fn test_missing_existing_cluster_skips_comparisons() {
        let mut fixture = Fixture::healthy(cluster_config("1.20"));
        fixture.existing = None;
        let opts = options(fixture.client(), provider(Vec::new()), cluster_config("1.30"));

        assert_eq!(
            run(opts).await,
            vec!["unable to read existing cluster testcluster: Cluster testcluster not found"]
        );
    }

    #[tokio::test]
    async fn test_missing_attached_configs_are_skipped() {
        let mut existing = cluster_config("1.30");
        existing.cluster.spec.identity_provider_refs = vec![Ref::new(AWS_IAM_CONFIG_KIND, "aws-iam")];
        existing.cluster.spec.git_ops_ref = Some(Ref::new(FLUX_CONFIG_KIND, "flux"));
        let desired = existing.clone();

        let opts = options(Fixture::healthy(existing).client(), provider(Vec::new()), desired);
        assert!(run(opts).await.is_empty());
    }

    #[tokio::test]
    async fn test_non_fatal_provider_error_becomes_finding() {
        let mut provider = MockProviderAdapter::new();
        provider.expect_validate_new_spec().returning(|_, desired| {
            Err(Error::provider_for(
                desired.cluster_name(),
                "vsphere",
                "VSphereDatacenterConfig testcluster is not defined",
            ))
        });
        let opts = options(
            Fixture::healthy(cluster_config("1.30")).client(),
            provider,
            cluster_config("1.30"),
        );

        assert_eq!(
            run(opts).await,
            vec!["provider error [vsphere] for testcluster: VSphereDatacenterConfig testcluster is not defined"]
        );
    }

    #[tokio::test]
    async fn test_unsupported_version_is_reported() {
        let mut reader = MockReleaseReader::new();
        reader
            .expect_supported_kube_versions()
            .returning(|| Ok(vec!["1.28".to_string(), "1.29".to_string()]));
        let mut opts = options(
            Fixture::healthy(cluster_config("1.29")).client(),
            provider(Vec::new()),
            cluster_config("1.30"),
        );
        opts.release_reader = Some(Arc::new(reader));

        assert_eq!(
            run(opts).await,
            vec!["kubernetes version 1.30 is not supported by this release"]
        );
    }

    #[tokio::test]
    async fn test_repeated_passes_agree() {
        let client: Arc<dyn ClusterClient> = Arc::new({
            let mut fixture = Fixture::healthy(cluster_config("1.27"));
            fixture.nodes = Some("node a is not ready, currently in False state");
            fixture.client()
        });
        let runner = PreflightRunner::new(PreflightOptions {
            client,
            provider: Arc::new(provider(Vec::new())),
            release_reader: None,
            workload_cluster: TargetCluster::new("testcluster", None),
            management_cluster: TargetCluster::new("mgmt", None),
            desired: cluster_config("1.30"),
            config: PreflightConfig::default(),
        });
        let cancel = CancellationToken::new();

        let first = runner.run(&cancel).await.unwrap();
        let second = runner.run(&cancel).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.findings.len(), 2);
    }

    // =========================================================================
    // Slow Clusters
    // =========================================================================

    /// Client whose readiness answers arrive after a delay
    ///
    /// Reads are served by `inner`. `started` is notified when the control
    /// plane check begins.
    struct DelayedCluster {
        inner: MockClusterClient,
        control_plane: Duration,
        workers: Duration,
        started: Arc<Notify>,
    }

    impl DelayedCluster {
        fn new(inner: MockClusterClient, control_plane: Duration, workers: Duration) -> Self {
            Self {
                inner,
                control_plane,
                workers,
                started: Arc::new(Notify::new()),
            }
        }
    }

    #[async_trait]
    impl ClusterClient for DelayedCluster {
        async fn get_clusters(&self, target: &TargetCluster) -> Result<Vec<CapiClusterRef>> {
            self.inner.get_clusters(target).await
        }

        async fn get_cluster(&self, target: &TargetCluster, namespace: &str, name: &str) -> Result<Cluster> {
            self.inner.get_cluster(target, namespace, name).await
        }

        async fn get_datacenter_config(
            &self,
            target: &TargetCluster,
            namespace: &str,
            kind: DatacenterKind,
            name: &str,
        ) -> Result<DatacenterConfig> {
            self.inner.get_datacenter_config(target, namespace, kind, name).await
        }

        async fn get_machine_config(
            &self,
            target: &TargetCluster,
            namespace: &str,
            kind: DatacenterKind,
            name: &str,
        ) -> Result<MachineConfig> {
            self.inner.get_machine_config(target, namespace, kind, name).await
        }

        async fn get_oidc_config(&self, target: &TargetCluster, namespace: &str, name: &str) -> Result<OIDCConfig> {
            self.inner.get_oidc_config(target, namespace, name).await
        }

        async fn get_aws_iam_config(
            &self,
            target: &TargetCluster,
            namespace: &str,
            name: &str,
        ) -> Result<AWSIamConfig> {
            self.inner.get_aws_iam_config(target, namespace, name).await
        }

        async fn get_gitops_config(
            &self,
            target: &TargetCluster,
            namespace: &str,
            name: &str,
        ) -> Result<GitOpsConfig> {
            self.inner.get_gitops_config(target, namespace, name).await
        }

        async fn get_flux_config(&self, target: &TargetCluster, namespace: &str, name: &str) -> Result<FluxConfig> {
            self.inner.get_flux_config(target, namespace, name).await
        }

        async fn validate_control_plane_nodes(&self, target: &TargetCluster, cluster_name: &str) -> Result<()> {
            self.started.notify_one();
            tokio::time::sleep(self.control_plane).await;
            self.inner.validate_control_plane_nodes(target, cluster_name).await
        }

        async fn validate_worker_nodes(&self, target: &TargetCluster, cluster_name: &str) -> Result<()> {
            tokio::time::sleep(self.workers).await;
            self.inner.validate_worker_nodes(target, cluster_name).await
        }

        async fn validate_nodes(&self, target: &TargetCluster) -> Result<()> {
            self.inner.validate_nodes(target).await
        }

        async fn validate_clusters_crd(&self, target: &TargetCluster) -> Result<()> {
            self.inner.validate_clusters_crd(target).await
        }
    }

    fn delayed_options(client: DelayedCluster, desired: ClusterConfig) -> PreflightOptions {
        PreflightOptions {
            client: Arc::new(client),
            ..options(MockClusterClient::new(), provider(Vec::new()), desired)
        }
    }

    /// Story: findings keep their check order when answers arrive in reverse
    ///
    /// The control plane answers last and the workers second to last, yet
    /// their findings still lead the report.
    #[tokio::test]
    async fn story_slow_readiness_checks_keep_check_order() {
        let mut fixture = Fixture::healthy(cluster_config("1.28"));
        fixture.clusters = vec!["othercluster"];
        fixture.control_plane = Some("control plane nodes are not ready");
        fixture.workers = Some("2 worker nodes are not ready");
        fixture.nodes = Some("node ip-10-0-0-1 is not ready, currently in Unknown state");
        fixture.crd = Some("error getting clusters crd: crd not found");
        let client = DelayedCluster::new(
            fixture.client(),
            Duration::from_millis(80),
            Duration::from_millis(40),
        );

        assert_eq!(
            run(delayed_options(client, cluster_config("1.30"))).await,
            vec![
                "control plane nodes are not ready",
                "2 worker nodes are not ready",
                "node ip-10-0-0-1 is not ready, currently in Unknown state",
                "error getting clusters crd: crd not found",
                "couldn't find CAPI cluster object for cluster with name testcluster",
                "spec: Invalid value: \"1.30\": only +1 minor version skew is supported, minor version skew detected 2",
            ]
        );
    }

    #[tokio::test]
    async fn test_cancel_during_remote_call_aborts_promptly() {
        let client = DelayedCluster::new(
            Fixture::healthy(cluster_config("1.29")).client(),
            Duration::from_secs(60),
            Duration::ZERO,
        );
        let started = client.started.clone();
        let runner = PreflightRunner::new(delayed_options(client, cluster_config("1.30")));
        let cancel = CancellationToken::new();

        let (result, ()) = tokio::join!(
            tokio::time::timeout(Duration::from_secs(5), runner.run(&cancel)),
            async {
                started.notified().await;
                cancel.cancel();
            },
        );

        let result = result.expect("pass did not stop after cancellation");
        assert!(matches!(result, Err(Error::Cancelled { .. })));
    }

    // =========================================================================
    // Aborted Passes
    // =========================================================================

    #[tokio::test]
    async fn test_cancelled_pass_returns_error() {
        let opts = options(
            Fixture::healthy(cluster_config("1.29")).client(),
            provider(Vec::new()),
            cluster_config("1.30"),
        );
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = PreflightRunner::new(opts).run(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_fatal_client_error_aborts_pass() {
        let mut fixture = Fixture::healthy(cluster_config("1.29"));
        fixture.clusters_fatal = true;
        let opts = options(fixture.client(), provider(Vec::new()), cluster_config("1.30"));

        let err = run_preflight_validations(opts, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    struct StalledRelease;

    #[async_trait]
    impl ReleaseReader for StalledRelease {
        async fn supported_kube_versions(&self) -> Result<Vec<String>> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_deadline_aborts_stalled_pass() {
        let mut opts = options(
            Fixture::healthy(cluster_config("1.29")).client(),
            provider(Vec::new()),
            cluster_config("1.30"),
        );
        opts.release_reader = Some(Arc::new(StalledRelease));
        opts.config.timeout = Some(Duration::from_millis(50));

        let err = PreflightRunner::new(opts)
            .run(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
    }
}
