//! Datacenter configuration CRDs, one per infrastructure provider

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::types::CloudStackResourceIdentifier;
use super::{
    CLOUDSTACK_DATACENTER_CONFIG_KIND, CLOUDSTACK_MACHINE_CONFIG_KIND,
    TINKERBELL_DATACENTER_CONFIG_KIND, TINKERBELL_MACHINE_CONFIG_KIND,
    VSPHERE_DATACENTER_CONFIG_KIND, VSPHERE_MACHINE_CONFIG_KIND,
};

// =============================================================================
// vSphere
// =============================================================================

/// vSphere datacenter placement and connection settings
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "VSphereDatacenterConfig",
    plural = "vspheredatacenterconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct VSphereDatacenterConfigSpec {
    /// vCenter datacenter name
    pub datacenter: String,
    /// Network the VMs attach to
    pub network: String,
    /// vCenter server address
    pub server: String,
    /// TLS thumbprint of the vCenter server
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thumbprint: String,
    /// Skip TLS verification
    #[serde(default)]
    pub insecure: bool,
}

// =============================================================================
// Tinkerbell (bare metal)
// =============================================================================

/// Tinkerbell provisioning stack settings
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "TinkerbellDatacenterConfig",
    plural = "tinkerbelldatacenterconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellDatacenterConfigSpec {
    /// Virtual IP of the Tinkerbell stack
    #[serde(rename = "tinkerbellIP")]
    pub tinkerbell_ip: String,
    /// Location of OS images
    #[serde(default, rename = "osImageURL")]
    pub os_image_url: String,
    /// Location of hook (in-memory installer) images
    #[serde(
        default,
        rename = "hookImagesURLPath",
        skip_serializing_if = "String::is_empty"
    )]
    pub hook_images_url_path: String,
    /// Skip deploying the stack's load balancer
    #[serde(default)]
    pub skip_load_balancer_deployment: bool,
}

// =============================================================================
// CloudStack
// =============================================================================

/// CloudStack zones the cluster spreads across
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "CloudStackDatacenterConfig",
    plural = "cloudstackdatacenterconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackDatacenterConfigSpec {
    /// Availability zones, each tied to one CloudStack endpoint
    #[serde(default)]
    pub availability_zones: Vec<CloudStackAvailabilityZone>,
}

/// One CloudStack availability zone
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackAvailabilityZone {
    /// Unique zone name within the datacenter config
    pub name: String,
    /// Credentials profile used for this zone
    #[serde(default)]
    pub credentials_ref: String,
    /// CloudStack zone and network
    pub zone: CloudStackZone,
    /// CloudStack domain
    #[serde(default)]
    pub domain: String,
    /// CloudStack account
    #[serde(default)]
    pub account: String,
    /// CloudStack management API URL
    #[serde(default)]
    pub management_api_endpoint: String,
}

/// CloudStack zone identity
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackZone {
    /// Zone name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Zone ID
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    /// Guest network inside the zone
    #[serde(default)]
    pub network: CloudStackResourceIdentifier,
}

// =============================================================================
// Provider-agnostic wrapper
// =============================================================================

/// Infrastructure provider families
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatacenterKind {
    /// VMware vSphere
    VSphere,
    /// Tinkerbell bare metal
    Tinkerbell,
    /// Apache CloudStack
    CloudStack,
}

impl DatacenterKind {
    /// All supported provider families
    pub const ALL: [DatacenterKind; 3] = [Self::VSphere, Self::Tinkerbell, Self::CloudStack];

    /// Kind string of the provider's datacenter config
    pub fn datacenter_config_kind(&self) -> &'static str {
        match self {
            Self::VSphere => VSPHERE_DATACENTER_CONFIG_KIND,
            Self::Tinkerbell => TINKERBELL_DATACENTER_CONFIG_KIND,
            Self::CloudStack => CLOUDSTACK_DATACENTER_CONFIG_KIND,
        }
    }

    /// Kind string of the provider's machine config
    pub fn machine_config_kind(&self) -> &'static str {
        match self {
            Self::VSphere => VSPHERE_MACHINE_CONFIG_KIND,
            Self::Tinkerbell => TINKERBELL_MACHINE_CONFIG_KIND,
            Self::CloudStack => CLOUDSTACK_MACHINE_CONFIG_KIND,
        }
    }

    /// Resolve a provider family from a datacenter config kind string
    pub fn from_datacenter_kind(kind: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|k| k.datacenter_config_kind() == kind)
    }
}

impl std::fmt::Display for DatacenterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::VSphere => write!(f, "vsphere"),
            Self::Tinkerbell => write!(f, "tinkerbell"),
            Self::CloudStack => write!(f, "cloudstack"),
        }
    }
}

/// A datacenter config of any provider
#[derive(Clone, Debug, PartialEq)]
pub enum DatacenterConfig {
    /// vSphere datacenter config
    VSphere(VSphereDatacenterConfig),
    /// Tinkerbell datacenter config
    Tinkerbell(TinkerbellDatacenterConfig),
    /// CloudStack datacenter config
    CloudStack(CloudStackDatacenterConfig),
}

impl DatacenterConfig {
    /// Provider family of this config
    pub fn kind(&self) -> DatacenterKind {
        match self {
            Self::VSphere(_) => DatacenterKind::VSphere,
            Self::Tinkerbell(_) => DatacenterKind::Tinkerbell,
            Self::CloudStack(_) => DatacenterKind::CloudStack,
        }
    }

    /// Object name
    pub fn name(&self) -> String {
        match self {
            Self::VSphere(c) => c.name_any(),
            Self::Tinkerbell(c) => c.name_any(),
            Self::CloudStack(c) => c.name_any(),
        }
    }

    /// Serialize the whole object into a structural value for diffing
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        let value = match self {
            Self::VSphere(c) => serde_json::to_value(c),
            Self::Tinkerbell(c) => serde_json::to_value(c),
            Self::CloudStack(c) => serde_json::to_value(c),
        };
        value.map_err(|e| {
            crate::Error::serialization_for_kind(self.kind().datacenter_config_kind(), e.to_string())
        })
    }
}
