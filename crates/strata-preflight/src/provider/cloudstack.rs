//! CloudStack infrastructure provider

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use kube::ResourceExt;
use strata_common::crd::{DatacenterConfig, DatacenterKind};
use strata_common::{ClusterConfig, Error, Result};

use super::{desired_datacenter_config, diff_provider_configs, provider_finding, ProviderAdapter};
use crate::client::{ClusterClient, TargetCluster};
use crate::finding::Finding;
use crate::policy::{Comparison, FieldRule, ObjectPolicy, Render};

const PROVIDER_NAME: &str = "cloudstack";

/// Immutability table of `CloudStackDatacenterConfig`
///
/// Availability zones may be added and removed across upgrades.
pub static CLOUDSTACK_DATACENTER_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "CloudStackDatacenterConfig",
    rules: &[FieldRule::mutable("spec.availabilityZones")],
    collapse: None,
};

/// Immutability table of `CloudStackMachineConfig`
pub static CLOUDSTACK_MACHINE_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "CloudStackMachineConfig",
    rules: &[
        FieldRule::labeled("spec.users[*].name", "spec.users[{}].name", Comparison::Exact)
            .with_render(Render::PreviousNew),
        FieldRule::labeled(
            "spec.users[*].sshAuthorizedKeys[*]",
            "spec.users[{}].sshAuthorizedKeys[{}]",
            Comparison::Exact,
        )
        .with_render(Render::PreviousNew),
        FieldRule::labeled(
            "spec.affinityGroupIds",
            "spec.affinityGroupIds",
            Comparison::UnorderedSet,
        ),
        FieldRule::mutable("spec.template"),
        FieldRule::mutable("spec.computeOffering"),
        FieldRule::mutable("spec.diskOffering"),
        FieldRule::mutable("spec.userCustomDetails"),
        FieldRule::mutable("spec.symlinks"),
    ],
    collapse: None,
};

/// CloudStack provider adapter
pub struct CloudStackProvider {
    client: Arc<dyn ClusterClient>,
}

impl CloudStackProvider {
    /// Create an adapter reading existing objects through `client`
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    fn validate_availability_zones(&self, desired: &ClusterConfig) -> Vec<Finding> {
        let Ok(DatacenterConfig::CloudStack(config)) = self.datacenter_config(desired) else {
            return Vec::new();
        };
        let kind = DatacenterKind::CloudStack.datacenter_config_kind();
        let name = config.name_any();
        let zones = &config.spec.availability_zones;

        let mut messages = Vec::new();
        if zones.is_empty() {
            messages.push(format!("{kind} {name}: at least one availability zone is required"));
        }
        let mut seen = BTreeSet::new();
        for (i, zone) in zones.iter().enumerate() {
            if zone.name.is_empty() {
                messages.push(format!("{kind} {name}: availability zone {i} has no name"));
            } else if !seen.insert(zone.name.as_str()) {
                messages.push(format!(
                    "{kind} {name}: availability zone {} is defined more than once",
                    zone.name
                ));
            }
        }

        let cluster = desired.cluster_name();
        messages
            .into_iter()
            .map(|msg| provider_finding(&Error::provider_for(&cluster, PROVIDER_NAME, msg)))
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for CloudStackProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn datacenter_kind(&self) -> DatacenterKind {
        DatacenterKind::CloudStack
    }

    fn datacenter_config(&self, desired: &ClusterConfig) -> Result<DatacenterConfig> {
        desired_datacenter_config(PROVIDER_NAME, self.datacenter_kind(), desired)
    }

    fn datacenter_policy(&self) -> &'static ObjectPolicy {
        &CLOUDSTACK_DATACENTER_POLICY
    }

    fn machine_config_policy(&self) -> &'static ObjectPolicy {
        &CLOUDSTACK_MACHINE_POLICY
    }

    async fn validate_new_spec(
        &self,
        target: &TargetCluster,
        desired: &ClusterConfig,
    ) -> Result<Vec<Finding>> {
        let mut findings = diff_provider_configs(self, self.client.as_ref(), target, desired).await?;
        findings.extend(self.validate_availability_zones(desired));
        Ok(findings)
    }
}
