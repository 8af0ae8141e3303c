//! Cluster client abstraction
//!
//! The preflight engine only reads. [`ClusterClient`] is the seam between the
//! validators and the API servers they read from; the production
//! implementation talks to Kubernetes through kube-rs and tests substitute
//! mocks or in-memory doubles.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use k8s_openapi::api::core::v1::Node;
use kube::api::{Api, DynamicObject, ListParams};
use kube::{Client, Resource, ResourceExt};
#[cfg(test)]
use mockall::automock;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strata_common::crd::{
    AWSIamConfig, CloudStackDatacenterConfig, CloudStackMachineConfig, Cluster, DatacenterConfig,
    DatacenterKind, FluxConfig, GitOpsConfig, MachineConfig, OIDCConfig,
    TinkerbellDatacenterConfig, TinkerbellMachineConfig, VSphereDatacenterConfig,
    VSphereMachineConfig,
};
use strata_common::kube_utils::{
    condition_status, create_client, crd_exists, discover_resource, CONDITION_READY, STATUS_TRUE,
    STATUS_UNKNOWN,
};
use strata_common::{Error, Result, CLUSTERS_CRD_NAME};
use tracing::debug;

/// API group of CAPI core resources
pub const CAPI_GROUP: &str = "cluster.x-k8s.io";
/// API group of the kubeadm control plane provider
pub const CAPI_CONTROL_PLANE_GROUP: &str = "controlplane.cluster.x-k8s.io";
/// Label CAPI puts on every object belonging to a cluster
pub const CAPI_CLUSTER_NAME_LABEL: &str = "cluster.x-k8s.io/cluster-name";

/// A cluster reachable through a kubeconfig
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TargetCluster {
    /// Logical cluster name
    pub name: String,
    /// Kubeconfig to reach it; inferred from the environment when absent
    pub kubeconfig: Option<PathBuf>,
}

impl TargetCluster {
    /// Create a target
    pub fn new(name: impl Into<String>, kubeconfig: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kubeconfig,
        }
    }
}

/// A CAPI cluster object visible on a cluster
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CapiClusterRef {
    /// Object name
    pub name: String,
    /// Object namespace
    pub namespace: Option<String>,
}

impl CapiClusterRef {
    /// Create a reference
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
        }
    }
}

/// Read access to the objects and health signals a preflight pass needs
///
/// Readiness methods return `Ok(())` when healthy and a non-fatal error whose
/// display form is the finding message otherwise. Typed gets return
/// [`Error::NotFound`] for absent objects.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List the CAPI cluster objects on a cluster
    async fn get_clusters(&self, target: &TargetCluster) -> Result<Vec<CapiClusterRef>>;

    /// Get a cluster object
    async fn get_cluster(&self, target: &TargetCluster, namespace: &str, name: &str)
        -> Result<Cluster>;

    /// Get the datacenter config of the given provider family
    async fn get_datacenter_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<DatacenterConfig>;

    /// Get a machine config of the given provider family
    async fn get_machine_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<MachineConfig>;

    /// Get an OIDC identity provider config
    async fn get_oidc_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<OIDCConfig>;

    /// Get an AWS IAM identity provider config
    async fn get_aws_iam_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<AWSIamConfig>;

    /// Get a legacy GitOps config
    async fn get_gitops_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<GitOpsConfig>;

    /// Get a Flux config
    async fn get_flux_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<FluxConfig>;

    /// Check that the control plane machines of a cluster are ready and up to date
    async fn validate_control_plane_nodes(
        &self,
        target: &TargetCluster,
        cluster_name: &str,
    ) -> Result<()>;

    /// Check that the worker machines of a cluster are ready
    async fn validate_worker_nodes(&self, target: &TargetCluster, cluster_name: &str)
        -> Result<()>;

    /// Check that every node of a cluster reports Ready
    async fn validate_nodes(&self, target: &TargetCluster) -> Result<()>;

    /// Check that the clusters CRD is installed
    async fn validate_clusters_crd(&self, target: &TargetCluster) -> Result<()>;
}

// =============================================================================
// Real Implementation
// =============================================================================

/// [`ClusterClient`] over kube-rs
///
/// Clients are built lazily and cached per kubeconfig.
#[derive(Clone, Default)]
pub struct KubeClusterClient {
    clients: Arc<DashMap<Option<PathBuf>, Client>>,
}

impl KubeClusterClient {
    /// Create a client with an empty connection cache
    pub fn new() -> Self {
        Self::default()
    }

    async fn client(&self, target: &TargetCluster) -> Result<Client> {
        if let Some(client) = self.clients.get(&target.kubeconfig) {
            return Ok(client.clone());
        }
        let client = create_client(target.kubeconfig.as_deref()).await?;
        debug!(cluster = %target.name, "created kube client");
        self.clients
            .insert(target.kubeconfig.clone(), client.clone());
        Ok(client)
    }

    async fn get_namespaced<K>(&self, target: &TargetCluster, namespace: &str, name: &str) -> Result<K>
    where
        K: Resource<Scope = kube::core::NamespaceResourceScope, DynamicType = ()>
            + DeserializeOwned
            + Clone
            + std::fmt::Debug,
    {
        let api: Api<K> = Api::namespaced(self.client(target).await?, namespace);
        match api.get(name).await {
            Ok(obj) => Ok(obj),
            Err(kube::Error::Api(ae)) if ae.code == 404 => {
                Err(Error::not_found(K::kind(&()).to_string(), name))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// List CAPI-family objects labelled with a cluster name, across namespaces
    ///
    /// Returns an empty list when the kind is not served.
    async fn list_cluster_objects(
        &self,
        target: &TargetCluster,
        group: &str,
        kind: &str,
        cluster_name: &str,
    ) -> Result<Vec<DynamicObject>> {
        let client = self.client(target).await?;
        let Some(ar) = discover_resource(&client, group, kind).await? else {
            debug!(group, kind, "resource not served");
            return Ok(Vec::new());
        };
        let api: Api<DynamicObject> = Api::all_with(client, &ar);
        let params = ListParams::default().labels(&format!("{CAPI_CLUSTER_NAME_LABEL}={cluster_name}"));
        Ok(api.list(&params).await?.items)
    }
}

/// Replica counters from a CAPI status block
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct ReplicaStatus {
    replicas: i64,
    ready: i64,
    updated: i64,
}

impl ReplicaStatus {
    fn from_object(obj: &DynamicObject) -> Self {
        let status = obj.data.get("status");
        let field = |name: &str| {
            status
                .and_then(|s| s.get(name))
                .and_then(Value::as_i64)
                .unwrap_or(0)
        };
        Self {
            replicas: field("replicas"),
            ready: field("readyReplicas"),
            updated: field("updatedReplicas"),
        }
    }

    fn not_ready(&self) -> i64 {
        (self.replicas - self.ready).max(0)
    }

    fn is_rolled_out(&self) -> bool {
        self.ready == self.replicas && self.updated == self.replicas
    }
}

/// Message for the first node that is not Ready, if any
fn node_readiness_failure(nodes: &[Node]) -> Option<String> {
    nodes.iter().find_map(|node| {
        let conditions = node.status.as_ref().and_then(|s| s.conditions.as_deref());
        match condition_status(conditions, CONDITION_READY) {
            Some(STATUS_TRUE) => None,
            status => Some(format!(
                "node {} is not ready, currently in {} state",
                node.name_any(),
                status.unwrap_or(STATUS_UNKNOWN)
            )),
        }
    })
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_clusters(&self, target: &TargetCluster) -> Result<Vec<CapiClusterRef>> {
        let client = self.client(target).await?;
        let Some(ar) = discover_resource(&client, CAPI_GROUP, "Cluster").await? else {
            return Ok(Vec::new());
        };
        let api: Api<DynamicObject> = Api::all_with(client, &ar);
        let clusters = api.list(&ListParams::default()).await?;
        Ok(clusters
            .items
            .iter()
            .map(|c| CapiClusterRef {
                name: c.name_any(),
                namespace: c.namespace(),
            })
            .collect())
    }

    async fn get_cluster(&self, target: &TargetCluster, namespace: &str, name: &str) -> Result<Cluster> {
        self.get_namespaced(target, namespace, name).await
    }

    async fn get_datacenter_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<DatacenterConfig> {
        Ok(match kind {
            DatacenterKind::VSphere => DatacenterConfig::VSphere(
                self.get_namespaced::<VSphereDatacenterConfig>(target, namespace, name)
                    .await?,
            ),
            DatacenterKind::Tinkerbell => DatacenterConfig::Tinkerbell(
                self.get_namespaced::<TinkerbellDatacenterConfig>(target, namespace, name)
                    .await?,
            ),
            DatacenterKind::CloudStack => DatacenterConfig::CloudStack(
                self.get_namespaced::<CloudStackDatacenterConfig>(target, namespace, name)
                    .await?,
            ),
        })
    }

    async fn get_machine_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        kind: DatacenterKind,
        name: &str,
    ) -> Result<MachineConfig> {
        Ok(match kind {
            DatacenterKind::VSphere => MachineConfig::VSphere(
                self.get_namespaced::<VSphereMachineConfig>(target, namespace, name)
                    .await?,
            ),
            DatacenterKind::Tinkerbell => MachineConfig::Tinkerbell(
                self.get_namespaced::<TinkerbellMachineConfig>(target, namespace, name)
                    .await?,
            ),
            DatacenterKind::CloudStack => MachineConfig::CloudStack(
                self.get_namespaced::<CloudStackMachineConfig>(target, namespace, name)
                    .await?,
            ),
        })
    }

    async fn get_oidc_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<OIDCConfig> {
        self.get_namespaced(target, namespace, name).await
    }

    async fn get_aws_iam_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<AWSIamConfig> {
        self.get_namespaced(target, namespace, name).await
    }

    async fn get_gitops_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<GitOpsConfig> {
        self.get_namespaced(target, namespace, name).await
    }

    async fn get_flux_config(
        &self,
        target: &TargetCluster,
        namespace: &str,
        name: &str,
    ) -> Result<FluxConfig> {
        self.get_namespaced(target, namespace, name).await
    }

    async fn validate_control_plane_nodes(
        &self,
        target: &TargetCluster,
        cluster_name: &str,
    ) -> Result<()> {
        let planes = self
            .list_cluster_objects(target, CAPI_CONTROL_PLANE_GROUP, "KubeadmControlPlane", cluster_name)
            .await?;
        if planes.is_empty() {
            return Err(Error::not_found("KubeadmControlPlane", cluster_name));
        }
        if planes
            .iter()
            .any(|kcp| !ReplicaStatus::from_object(kcp).is_rolled_out())
        {
            return Err(Error::not_ready("control plane nodes are not ready"));
        }
        Ok(())
    }

    async fn validate_worker_nodes(&self, target: &TargetCluster, cluster_name: &str) -> Result<()> {
        let deployments = self
            .list_cluster_objects(target, CAPI_GROUP, "MachineDeployment", cluster_name)
            .await?;
        let not_ready: i64 = deployments
            .iter()
            .map(|md| ReplicaStatus::from_object(md).not_ready())
            .sum();
        if not_ready > 0 {
            return Err(Error::not_ready(format!("{not_ready} worker nodes are not ready")));
        }
        Ok(())
    }

    async fn validate_nodes(&self, target: &TargetCluster) -> Result<()> {
        let api: Api<Node> = Api::all(self.client(target).await?);
        let nodes = api.list(&ListParams::default()).await?;
        match node_readiness_failure(&nodes.items) {
            Some(message) => Err(Error::not_ready(message)),
            None => Ok(()),
        }
    }

    async fn validate_clusters_crd(&self, target: &TargetCluster) -> Result<()> {
        let client = self.client(target).await?;
        if crd_exists(&client, CLUSTERS_CRD_NAME).await? {
            Ok(())
        } else {
            Err(Error::not_ready("error getting clusters crd: crd not found"))
        }
    }
}
