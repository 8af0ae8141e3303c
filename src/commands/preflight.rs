//! `strata preflight` - check that a cluster can take an upgrade
//!
//! Parses the desired cluster configuration, connects to the workload and
//! management clusters and runs one preflight pass. Nothing on either
//! cluster is modified.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use strata_common::ClusterConfig;
use strata_preflight::config::timeout_from_secs;
use strata_preflight::{
    create_provider, ClusterClient, FileReleaseReader, KubeClusterClient,
    PreflightConfig, PreflightOptions, PreflightReport, PreflightRunner, ReleaseReader,
    TargetCluster,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Error, Result};

/// Line printed when a pass finds nothing
pub const PASSED_MESSAGE: &str = "All preflight validations passed";

/// Arguments of `strata preflight`
#[derive(Args, Clone, Debug, Default)]
pub struct PreflightArgs {
    /// Cluster configuration file describing the desired state
    #[arg(short = 'f', long = "cluster-config")]
    pub cluster_config: PathBuf,

    /// Kubeconfig of the cluster being upgraded
    #[arg(long)]
    pub kubeconfig: Option<PathBuf>,

    /// Kubeconfig of the managing cluster when the cluster is not self-managed
    ///
    /// Defaults to `--kubeconfig`.
    #[arg(long)]
    pub management_kubeconfig: Option<PathBuf>,

    /// Release bundle manifest listing the supported Kubernetes versions
    #[arg(long)]
    pub release_manifest: Option<PathBuf>,

    /// Deadline for the whole pass in seconds, 0 to wait indefinitely
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// SSH private key for a generic git GitOps repository
    #[arg(long)]
    pub git_private_key_file: Option<PathBuf>,

    /// Known-hosts file for the git server
    #[arg(long)]
    pub git_known_hosts_file: Option<PathBuf>,
}

impl PreflightArgs {
    /// Overlay command line flags on a configuration read from the environment
    pub fn apply_to(&self, mut config: PreflightConfig) -> PreflightConfig {
        if let Some(secs) = self.timeout_secs {
            config.timeout = timeout_from_secs(secs);
        }

        let mut credentials = config.git_credentials.take().unwrap_or_default();
        credentials.private_key_file = self
            .git_private_key_file
            .clone()
            .or(credentials.private_key_file);
        credentials.known_hosts_file = self
            .git_known_hosts_file
            .clone()
            .or(credentials.known_hosts_file);
        config.git_credentials = (!credentials.is_empty()).then_some(credentials);
        config
    }

    /// Workload and management targets for a desired configuration
    ///
    /// A self-managed cluster is its own management cluster.
    pub fn targets(&self, desired: &ClusterConfig) -> (TargetCluster, TargetCluster) {
        let workload = TargetCluster::new(desired.cluster_name(), self.kubeconfig.clone());
        if desired.cluster.is_self_managed() {
            return (workload.clone(), workload);
        }
        let management = TargetCluster::new(
            desired.cluster.managed_by(),
            self.management_kubeconfig
                .clone()
                .or_else(|| self.kubeconfig.clone()),
        );
        (workload, management)
    }
}

/// Read and parse the desired cluster configuration
pub async fn load_desired(path: &Path) -> Result<ClusterConfig> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::read_file(path, e))?;
    Ok(ClusterConfig::from_yaml(&content)?)
}

/// Assemble everything a pass needs around an existing client
pub fn build_options(
    args: &PreflightArgs,
    desired: ClusterConfig,
    client: Arc<dyn ClusterClient>,
    config: PreflightConfig,
) -> Result<PreflightOptions> {
    let kind = desired.datacenter_kind()?;
    let provider = Arc::from(create_provider(kind, client.clone()));
    let (workload_cluster, management_cluster) = args.targets(&desired);
    let release_reader = args
        .release_manifest
        .as_ref()
        .map(|path| Arc::new(FileReleaseReader::new(path)) as Arc<dyn ReleaseReader>);

    Ok(PreflightOptions {
        client,
        provider,
        release_reader,
        workload_cluster,
        management_cluster,
        desired,
        config: args.apply_to(config),
    })
}

/// Run one pass with the given client
pub async fn execute(
    args: &PreflightArgs,
    client: Arc<dyn ClusterClient>,
    config: PreflightConfig,
    cancel: &CancellationToken,
) -> Result<PreflightReport> {
    let desired = load_desired(&args.cluster_config).await?;
    let opts = build_options(args, desired, client, config)?;
    info!(
        cluster = %opts.desired.cluster_name(),
        provider = opts.provider.name(),
        management = %opts.management_cluster.name,
        "running upgrade preflight checks"
    );
    Ok(PreflightRunner::new(opts).run(cancel).await?)
}

/// Run one pass against live clusters
pub async fn run(args: &PreflightArgs, cancel: &CancellationToken) -> Result<PreflightReport> {
    let config = PreflightConfig::from_env()?;
    execute(args, Arc::new(KubeClusterClient::new()), config, cancel).await
}

/// Text printed for a completed pass
pub fn render(report: &PreflightReport) -> String {
    match report.clone().into_error() {
        Some(err) => err.to_string(),
        None => PASSED_MESSAGE.to_string(),
    }
}
