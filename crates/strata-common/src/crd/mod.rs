//! Custom Resource Definitions for strata
//!
//! A cluster configuration is a `Cluster` object plus the provider, identity
//! and GitOps objects it references by kind and name.

mod cluster;
mod datacenter;
mod gitops;
mod identity;
mod machine;
mod types;

pub use cluster::{Cluster, ClusterSpec};
pub use datacenter::{
    CloudStackAvailabilityZone, CloudStackDatacenterConfig, CloudStackDatacenterConfigSpec,
    CloudStackZone, DatacenterConfig, DatacenterKind, TinkerbellDatacenterConfig,
    TinkerbellDatacenterConfigSpec, VSphereDatacenterConfig, VSphereDatacenterConfigSpec,
};
pub use gitops::{
    Flux, FluxConfig, FluxConfigSpec, GitOpsConfig, GitOpsConfigSpec, GitProviderConfig, Github,
    GithubProviderConfig,
};
pub use identity::{
    AWSIamConfig, AWSIamConfigSpec, MapRoles, MapUsers, OIDCConfig, OIDCConfigSpec,
    OidcRequiredClaim,
};
pub use machine::{
    CloudStackMachineConfig, CloudStackMachineConfigSpec, MachineConfig, TinkerbellMachineConfig,
    TinkerbellMachineConfigSpec, VSphereMachineConfig, VSphereMachineConfigSpec,
};
pub use types::{
    BundlesRef, CloudStackResourceIdentifier, ClusterNetwork, ControlPlaneConfiguration, Dns,
    Endpoint, ExternalEtcdConfiguration, ManagementCluster, OsFamily, Pods, ProxyConfiguration,
    Ref, ResolvConf, Services, UserConfiguration, WorkerNodeGroupConfiguration,
};

/// Kind of the root cluster object
pub const CLUSTER_KIND: &str = "Cluster";
/// Kind of the vSphere datacenter config
pub const VSPHERE_DATACENTER_CONFIG_KIND: &str = "VSphereDatacenterConfig";
/// Kind of the vSphere machine config
pub const VSPHERE_MACHINE_CONFIG_KIND: &str = "VSphereMachineConfig";
/// Kind of the Tinkerbell datacenter config
pub const TINKERBELL_DATACENTER_CONFIG_KIND: &str = "TinkerbellDatacenterConfig";
/// Kind of the Tinkerbell machine config
pub const TINKERBELL_MACHINE_CONFIG_KIND: &str = "TinkerbellMachineConfig";
/// Kind of the CloudStack datacenter config
pub const CLOUDSTACK_DATACENTER_CONFIG_KIND: &str = "CloudStackDatacenterConfig";
/// Kind of the CloudStack machine config
pub const CLOUDSTACK_MACHINE_CONFIG_KIND: &str = "CloudStackMachineConfig";
/// Kind of the OIDC identity provider config
pub const OIDC_CONFIG_KIND: &str = "OIDCConfig";
/// Kind of the AWS IAM identity provider config
pub const AWS_IAM_CONFIG_KIND: &str = "AWSIamConfig";
/// Kind of the legacy GitOps config
pub const GITOPS_CONFIG_KIND: &str = "GitOpsConfig";
/// Kind of the Flux config
pub const FLUX_CONFIG_KIND: &str = "FluxConfig";
