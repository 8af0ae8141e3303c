//! Cluster Custom Resource Definition
//!
//! The Cluster CRD is the root of a cluster configuration. Everything else
//! (datacenter, machine, identity and GitOps configs) hangs off it by reference.

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::{
    BundlesRef, ClusterNetwork, ControlPlaneConfiguration, ExternalEtcdConfiguration,
    ManagementCluster, ProxyConfiguration, Ref, WorkerNodeGroupConfiguration,
};
use super::{AWS_IAM_CONFIG_KIND, OIDC_CONFIG_KIND};

/// Specification for a Cluster
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "Cluster",
    plural = "clusters",
    namespaced,
    derive = "PartialEq",
    printcolumn = r#"{"name":"K8s","type":"string","jsonPath":".spec.kubernetesVersion"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    /// Kubernetes version of the control plane (e.g., "1.30")
    pub kubernetes_version: String,

    /// Control plane topology
    #[serde(default)]
    pub control_plane_configuration: ControlPlaneConfiguration,

    /// Worker node groups
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub worker_node_group_configurations: Vec<WorkerNodeGroupConfiguration>,

    /// Datacenter configuration for the infrastructure provider
    #[serde(default)]
    pub datacenter_ref: Ref,

    /// External etcd topology; absent means stacked etcd
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_etcd_configuration: Option<ExternalEtcdConfiguration>,

    /// Identity providers attached to the API server
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identity_provider_refs: Vec<Ref>,

    /// GitOps configuration driving this cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ops_ref: Option<Ref>,

    /// Pod, service and DNS networking
    #[serde(default)]
    pub cluster_network: ClusterNetwork,

    /// Outbound proxy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_configuration: Option<ProxyConfiguration>,

    /// The cluster managing this one
    #[serde(default)]
    pub management_cluster: ManagementCluster,

    /// Release bundle the cluster runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundles_ref: Option<BundlesRef>,

    /// Release version of the tooling that created the cluster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eksa_version: Option<String>,
}

impl ClusterSpec {
    /// Identity provider refs of the given kind
    pub fn identity_provider_refs_of(&self, kind: &str) -> Vec<&Ref> {
        self.identity_provider_refs
            .iter()
            .filter(|r| r.kind == kind)
            .collect()
    }

    /// Machine config refs used by the control plane, external etcd and worker groups
    ///
    /// Duplicates are removed; the first occurrence wins.
    pub fn machine_config_refs(&self) -> Vec<&Ref> {
        let mut refs: Vec<&Ref> = Vec::new();
        let candidates = self
            .control_plane_configuration
            .machine_group_ref
            .iter()
            .chain(
                self.external_etcd_configuration
                    .iter()
                    .filter_map(|e| e.machine_group_ref.as_ref()),
            )
            .chain(
                self.worker_node_group_configurations
                    .iter()
                    .filter_map(|w| w.machine_group_ref.as_ref()),
            );
        for r in candidates {
            if !refs.contains(&r) {
                refs.push(r);
            }
        }
        refs
    }
}

impl Cluster {
    /// Name of the cluster, empty when metadata has no name
    pub fn cluster_name(&self) -> String {
        self.name_any()
    }

    /// Whether this cluster manages itself
    ///
    /// An empty management cluster name is treated as self-managed.
    pub fn is_self_managed(&self) -> bool {
        let managed_by = &self.spec.management_cluster.name;
        managed_by.is_empty() || *managed_by == self.cluster_name()
    }

    /// Effective name of the cluster that manages this one
    pub fn managed_by(&self) -> String {
        if self.spec.management_cluster.name.is_empty() {
            self.cluster_name()
        } else {
            self.spec.management_cluster.name.clone()
        }
    }

    /// AWS IAM identity provider refs
    pub fn aws_iam_refs(&self) -> Vec<&Ref> {
        self.spec.identity_provider_refs_of(AWS_IAM_CONFIG_KIND)
    }

    /// OIDC identity provider refs
    pub fn oidc_refs(&self) -> Vec<&Ref> {
        self.spec.identity_provider_refs_of(OIDC_CONFIG_KIND)
    }
}
