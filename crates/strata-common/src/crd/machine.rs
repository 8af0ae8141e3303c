//! Machine configuration CRDs, one per infrastructure provider

use std::collections::BTreeMap;

use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::datacenter::DatacenterKind;
use super::types::{CloudStackResourceIdentifier, OsFamily, Ref, UserConfiguration};

/// vSphere VM template and sizing
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "VSphereMachineConfig",
    plural = "vspheremachineconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct VSphereMachineConfigSpec {
    /// Datastore holding VM disks
    #[serde(default)]
    pub datastore: String,
    /// VM folder
    #[serde(default)]
    pub folder: String,
    /// Resource pool
    #[serde(default)]
    pub resource_pool: String,
    /// VM template
    #[serde(default)]
    pub template: String,
    /// Storage policy applied to VM disks
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub storage_policy_name: String,
    /// Virtual CPUs
    #[serde(default, rename = "numCPUs")]
    pub num_cpus: u32,
    /// Memory in MiB
    #[serde(default, rename = "memoryMiB")]
    pub memory_mib: u32,
    /// Disk size in GiB
    #[serde(default, rename = "diskGiB")]
    pub disk_gib: u32,
    /// OS family of the template
    #[serde(default)]
    pub os_family: OsFamily,
    /// SSH users
    #[serde(default)]
    pub users: Vec<UserConfiguration>,
}

/// Bare-metal hardware selection and host OS settings
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "TinkerbellMachineConfig",
    plural = "tinkerbellmachineconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct TinkerbellMachineConfigSpec {
    /// Labels a hardware object must carry to be used by this machine config
    #[serde(default)]
    pub hardware_selector: BTreeMap<String, String>,
    /// OS family installed on the hardware
    #[serde(default)]
    pub os_family: OsFamily,
    /// SSH users
    #[serde(default)]
    pub users: Vec<UserConfiguration>,
    /// Free-form host OS configuration
    #[serde(
        default,
        rename = "hostOSConfiguration",
        skip_serializing_if = "Option::is_none"
    )]
    pub host_os_configuration: Option<serde_json::Value>,
    /// Provisioning workflow template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_ref: Option<Ref>,
}

/// CloudStack instance template and offerings
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "CloudStackMachineConfig",
    plural = "cloudstackmachineconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct CloudStackMachineConfigSpec {
    /// Instance template
    #[serde(default)]
    pub template: CloudStackResourceIdentifier,
    /// Compute offering
    #[serde(default)]
    pub compute_offering: CloudStackResourceIdentifier,
    /// Optional data disk offering
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disk_offering: Option<CloudStackResourceIdentifier>,
    /// SSH users
    #[serde(default)]
    pub users: Vec<UserConfiguration>,
    /// Affinity groups the instances join
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub affinity_group_ids: Vec<String>,
    /// Extra instance details
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_custom_details: BTreeMap<String, String>,
    /// Symlinks created on the instance
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub symlinks: BTreeMap<String, String>,
}

/// A machine config of any provider
#[derive(Clone, Debug, PartialEq)]
pub enum MachineConfig {
    /// vSphere machine config
    VSphere(VSphereMachineConfig),
    /// Tinkerbell machine config
    Tinkerbell(TinkerbellMachineConfig),
    /// CloudStack machine config
    CloudStack(CloudStackMachineConfig),
}

impl MachineConfig {
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

    /// SSH users configured on the machines
    pub fn users(&self) -> &[UserConfiguration] {
        match self {
            Self::VSphere(c) => &c.spec.users,
            Self::Tinkerbell(c) => &c.spec.users,
            Self::CloudStack(c) => &c.spec.users,
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
            crate::Error::serialization_for_kind(self.kind().machine_config_kind(), e.to_string())
        })
    }
}
