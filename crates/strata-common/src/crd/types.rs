//! Supporting types shared by the strata configuration CRDs

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference from one configuration object to another by kind and name
#[derive(
    Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "camelCase")]
pub struct Ref {
    /// Kind of the referenced object (e.g., "VSphereMachineConfig")
    pub kind: String,
    /// Name of the referenced object
    pub name: String,
}

impl Ref {
    /// Create a reference to an object of the given kind
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Control plane API endpoint
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Host (IP or DNS name) serving the Kubernetes API
    pub host: String,
}

/// Control plane topology and machine reference
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ControlPlaneConfiguration {
    /// Number of control plane nodes
    #[serde(default)]
    pub count: u32,

    /// API endpoint of the control plane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,

    /// Machine configuration used for control plane nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_group_ref: Option<Ref>,

    /// Free-form kubelet configuration passed through to the nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_configuration: Option<serde_json::Value>,
}

/// A group of worker nodes sharing a machine configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WorkerNodeGroupConfiguration {
    /// Unique name of the worker group
    pub name: String,

    /// Number of nodes in the group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,

    /// Machine configuration used for the group's nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_group_ref: Option<Ref>,

    /// Kubernetes version for this group, when it differs from the control plane
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubernetes_version: Option<String>,

    /// Free-form kubelet configuration passed through to the nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kubelet_configuration: Option<serde_json::Value>,

    /// Node labels applied to the group
    #[serde(default, skip_serializing_if = "std::collections::BTreeMap::is_empty")]
    pub labels: std::collections::BTreeMap<String, String>,
}

/// Cluster network configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterNetwork {
    /// Pod CIDR configuration
    #[serde(default)]
    pub pods: Pods,
    /// Service CIDR configuration
    #[serde(default)]
    pub services: Services,
    /// DNS configuration
    #[serde(default)]
    pub dns: Dns,
}

/// Pod network CIDRs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Pods {
    /// CIDR blocks assigned to pods
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,
}

/// Service network CIDRs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Services {
    /// CIDR blocks assigned to services
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cidr_blocks: Vec<String>,
}

/// Node DNS configuration
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Dns {
    /// Custom resolv.conf used by kubelet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolv_conf: Option<ResolvConf>,
}

/// Path to a resolv.conf file on the nodes
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResolvConf {
    /// Absolute path on the node
    pub path: String,
}

/// Outbound proxy settings
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    /// HTTP proxy URL
    #[serde(default)]
    pub http_proxy: String,
    /// HTTPS proxy URL
    #[serde(default)]
    pub https_proxy: String,
    /// Destinations that bypass the proxy
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub no_proxy: Vec<String>,
}

/// Stacked-out etcd topology
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExternalEtcdConfiguration {
    /// Number of etcd members
    #[serde(default)]
    pub count: u32,
    /// Machine configuration used for etcd members
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_group_ref: Option<Ref>,
}

/// Reference to the cluster that manages this one
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ManagementCluster {
    /// Name of the management cluster (empty or own name when self-managed)
    #[serde(default)]
    pub name: String,
}

/// Reference to the release bundle the cluster runs
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BundlesRef {
    /// Bundle name
    pub name: String,
    /// Bundle namespace
    pub namespace: String,
}

/// SSH user provisioned on machines
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfiguration {
    /// Login name
    pub name: String,
    /// Public keys allowed to log in as this user
    #[serde(default)]
    pub ssh_authorized_keys: Vec<String>,
}

/// Operating system family of machine images
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Ubuntu images
    #[default]
    Ubuntu,
    /// Bottlerocket images
    Bottlerocket,
    /// Red Hat Enterprise Linux images
    Redhat,
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Bottlerocket => write!(f, "bottlerocket"),
            Self::Redhat => write!(f, "redhat"),
        }
    }
}

/// Named (and optionally identified) CloudStack resource
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackResourceIdentifier {
    /// Resource name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Resource ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
}
