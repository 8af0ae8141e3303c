//! vSphere infrastructure provider

use std::sync::Arc;

use async_trait::async_trait;
use strata_common::crd::{DatacenterConfig, DatacenterKind};
use strata_common::{ClusterConfig, Error, Result};

use super::{desired_datacenter_config, diff_provider_configs, provider_finding, ProviderAdapter};
use crate::client::{ClusterClient, TargetCluster};
use crate::finding::Finding;
use crate::policy::{Comparison, FieldRule, ObjectPolicy, Render};

const PROVIDER_NAME: &str = "vsphere";

/// Immutability table of `VSphereDatacenterConfig`
pub static VSPHERE_DATACENTER_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "VSphereDatacenterConfig",
    rules: &[
        FieldRule::exact("spec.server"),
        FieldRule::exact("spec.datacenter"),
        FieldRule::exact("spec.network"),
        FieldRule::mutable("spec.thumbprint"),
        FieldRule::mutable("spec.insecure"),
    ],
    collapse: None,
};

/// Immutability table of `VSphereMachineConfig`
pub static VSPHERE_MACHINE_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "VSphereMachineConfig",
    rules: &[
        FieldRule::exact("spec.osFamily"),
        FieldRule::labeled("spec.users[*].name", "spec.users[{}].name", Comparison::Exact)
            .with_render(Render::PreviousNew),
        FieldRule::labeled(
            "spec.users[*].sshAuthorizedKeys[*]",
            "spec.users[{}].sshAuthorizedKeys[{}]",
            Comparison::Exact,
        )
        .with_render(Render::PreviousNew),
        FieldRule::exact("spec.storagePolicyName"),
        FieldRule::mutable("spec.template"),
        FieldRule::mutable("spec.datastore"),
        FieldRule::mutable("spec.folder"),
        FieldRule::mutable("spec.resourcePool"),
        FieldRule::mutable("spec.numCPUs"),
        FieldRule::mutable("spec.memoryMiB"),
        FieldRule::mutable("spec.diskGiB"),
    ],
    collapse: None,
};

/// vSphere provider adapter
pub struct VSphereProvider {
    client: Arc<dyn ClusterClient>,
}

impl VSphereProvider {
    /// Create an adapter reading existing objects through `client`
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    /// Every machine group ref must name a vSphere machine config of the desired spec
    fn validate_machine_refs(desired: &ClusterConfig) -> Vec<Finding> {
        let cluster = desired.cluster_name();
        desired
            .cluster
            .spec
            .machine_config_refs()
            .into_iter()
            .filter_map(|r| match desired.machine_config(&r.name) {
                None => Some(format!("machine config {} is not defined", r.name)),
                Some(config) if config.kind() != DatacenterKind::VSphere => Some(format!(
                    "machine config {} must be a {}",
                    r.name,
                    DatacenterKind::VSphere.machine_config_kind()
                )),
                Some(_) => None,
            })
            .map(|msg| provider_finding(&Error::provider_for(&cluster, PROVIDER_NAME, msg)))
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for VSphereProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn datacenter_kind(&self) -> DatacenterKind {
        DatacenterKind::VSphere
    }

    fn datacenter_config(&self, desired: &ClusterConfig) -> Result<DatacenterConfig> {
        desired_datacenter_config(PROVIDER_NAME, self.datacenter_kind(), desired)
    }

    fn datacenter_policy(&self) -> &'static ObjectPolicy {
        &VSPHERE_DATACENTER_POLICY
    }

    fn machine_config_policy(&self) -> &'static ObjectPolicy {
        &VSPHERE_MACHINE_POLICY
    }

    async fn validate_new_spec(
        &self,
        target: &TargetCluster,
        desired: &ClusterConfig,
    ) -> Result<Vec<Finding>> {
        let mut findings = diff_provider_configs(self, self.client.as_ref(), target, desired).await?;
        findings.extend(Self::validate_machine_refs(desired));
        Ok(findings)
    }
}
