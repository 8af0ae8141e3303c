//! In-memory cluster serving an existing configuration

use std::collections::BTreeSet;
use std::sync::Mutex;

use async_trait::async_trait;
use strata_common::crd::{
    AWSIamConfig, Cluster, DatacenterConfig, DatacenterKind, FluxConfig, GitOpsConfig,
    MachineConfig, OIDCConfig,
};
use strata_common::{ClusterConfig, Error, Result};
use strata_preflight::{CapiClusterRef, ClusterClient, TargetCluster};

/// Health and contents of a fake cluster
#[derive(Default)]
pub struct FakeCluster {
    /// Configuration currently applied; `None` when the cluster object is gone
    pub existing: Option<ClusterConfig>,
    /// Names of the CAPI cluster objects present
    pub capi_clusters: Vec<String>,
    /// Whether the clusters CRD is installed
    pub crd_installed: bool,
    /// Whether the control plane machines are ready
    pub control_plane_ready: bool,
    /// Number of worker machines that are not ready
    pub unready_workers: u32,
    /// Nodes that are not ready, with their Ready condition status
    pub unready_nodes: Vec<(String, String)>,
    /// Every call fails as if the API server went away
    pub unreachable: bool,
    calls: Mutex<BTreeSet<(String, &'static str)>>,
}

impl FakeCluster {
    /// A healthy cluster running `existing`
    pub fn healthy(existing: ClusterConfig) -> Self {
        Self {
            capi_clusters: vec![existing.cluster_name()],
            existing: Some(existing),
            crd_installed: true,
            control_plane_ready: true,
            ..Default::default()
        }
    }

    /// Targets that served the given call
    pub fn targets_of(&self, call: &str) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| {
                calls
                    .iter()
                    .filter(|(_, c)| *c == call)
                    .map(|(target, _)| target.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn record(&self, target: &TargetCluster, call: &'static str) -> Result<()> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.insert((target.name.clone(), call));
        }
        if self.unreachable {
            return Err(Error::internal_with_context(call, "connection refused"));
        }
        Ok(())
    }

    fn existing(&self) -> Option<&ClusterConfig> {
        self.existing.as_ref()
    }
}

fn find<T: Clone>(found: Option<&T>, kind: &str, name: &str) -> Result<T> {
    found.cloned().ok_or_else(|| Error::not_found(kind, name))
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_clusters(&self, target: &TargetCluster) -> Result<Vec<CapiClusterRef>> {
        self.record(target, "get_clusters")?;
        Ok(self.capi_clusters.iter().map(CapiClusterRef::new).collect())
    }

    async fn get_cluster(&self, target: &TargetCluster, _namespace: &str, name: &str) -> Result<Cluster> {
        self.record(target, "get_cluster")?;
        let cluster = self
            .existing()
            .map(|e| &e.cluster)
            .filter(|c| c.cluster_name() == name);
        find(cluster, "Cluster", name)
    }

    async fn get_datacenter_config(
        &self,
        target: &TargetCluster,
        _namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<DatacenterConfig> {
        self.record(target, "get_datacenter_config")?;
        let config = self
            .existing()
            .and_then(|e| e.datacenter_config.as_ref())
            .filter(|c| c.kind() == kind && c.name() == name);
        find(config, kind.datacenter_config_kind(), name)
    }

    async fn get_machine_config(
        &self,
        target: &TargetCluster,
        _namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<MachineConfig> {
        self.record(target, "get_machine_config")?;
        let config = self
            .existing()
            .and_then(|e| e.machine_config(name))
            .filter(|c| c.kind() == kind);
        find(config, kind.machine_config_kind(), name)
    }

    async fn get_oidc_config(&self, target: &TargetCluster, _namespace: &str, name: &str) -> Result<OIDCConfig> {
        self.record(target, "get_oidc_config")?;
        find(self.existing().and_then(|e| e.oidc_configs.get(name)), "OIDCConfig", name)
    }

    async fn get_aws_iam_config(
        &self,
        target: &TargetCluster,
        _namespace: &str,
        name: &str,
    ) -> Result<AWSIamConfig> {
        self.record(target, "get_aws_iam_config")?;
        let config = self
            .existing()
            .and_then(|e| e.aws_iam_config.as_ref())
            .filter(|c| c.metadata.name.as_deref() == Some(name));
        find(config, "AWSIamConfig", name)
    }

    async fn get_gitops_config(
        &self,
        target: &TargetCluster,
        _namespace: &str,
        name: &str,
    ) -> Result<GitOpsConfig> {
        self.record(target, "get_gitops_config")?;
        let config = self
            .existing()
            .and_then(|e| e.gitops_config.as_ref())
            .filter(|c| c.metadata.name.as_deref() == Some(name));
        find(config, "GitOpsConfig", name)
    }

    async fn get_flux_config(&self, target: &TargetCluster, _namespace: &str, name: &str) -> Result<FluxConfig> {
        self.record(target, "get_flux_config")?;
        let config = self
            .existing()
            .and_then(|e| e.flux_config.as_ref())
            .filter(|c| c.metadata.name.as_deref() == Some(name));
        find(config, "FluxConfig", name)
    }

    async fn validate_control_plane_nodes(&self, target: &TargetCluster, _cluster_name: &str) -> Result<()> {
        self.record(target, "validate_control_plane_nodes")?;
        if self.control_plane_ready {
            return Ok(());
        }
        Err(Error::not_ready("control plane nodes are not ready"))
    }

    async fn validate_worker_nodes(&self, target: &TargetCluster, _cluster_name: &str) -> Result<()> {
        self.record(target, "validate_worker_nodes")?;
        match self.unready_workers {
            0 => Ok(()),
            n => Err(Error::not_ready(format!("{n} worker nodes are not ready"))),
        }
    }

    async fn validate_nodes(&self, target: &TargetCluster) -> Result<()> {
        self.record(target, "validate_nodes")?;
        match self.unready_nodes.first() {
            None => Ok(()),
            Some((node, status)) => Err(Error::not_ready(format!(
                "node {node} is not ready, currently in {status} state"
            ))),
        }
    }

    async fn validate_clusters_crd(&self, target: &TargetCluster) -> Result<()> {
        self.record(target, "validate_clusters_crd")?;
        if self.crd_installed {
            return Ok(());
        }
        Err(Error::not_ready("error getting clusters crd: crd not found"))
    }
}
