//! Tinkerbell bare-metal provider
//!
//! Bare-metal machines are claimed by hardware selector, so a machine config
//! without one could never be scheduled. The selector and the provisioning
//! endpoint addresses are pinned for the life of the cluster.

use std::sync::Arc;

use async_trait::async_trait;
use strata_common::crd::{DatacenterConfig, DatacenterKind, MachineConfig};
use strata_common::{ClusterConfig, Error, Result};

use super::{desired_datacenter_config, diff_provider_configs, provider_finding, ProviderAdapter};
use crate::client::{ClusterClient, TargetCluster};
use crate::finding::Finding;
use crate::policy::{Comparison, FieldRule, ObjectPolicy, Render};

const PROVIDER_NAME: &str = "tinkerbell";

/// Immutability table of `TinkerbellDatacenterConfig`
pub static TINKERBELL_DATACENTER_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "TinkerbellDatacenterConfig",
    rules: &[
        FieldRule::labeled("spec.tinkerbellIP", "spec.tinkerbellIP", Comparison::Exact)
            .with_render(Render::InlinePreviousNew),
        FieldRule::labeled(
            "spec.hookImagesURLPath",
            "spec.hookImagesURLPath",
            Comparison::Exact,
        )
        .with_render(Render::SentencePreviousNew),
        FieldRule::mutable("spec.osImageURL"),
        FieldRule::mutable("spec.skipLoadBalancerDeployment"),
    ],
    collapse: None,
};

/// Immutability table of `TinkerbellMachineConfig`
pub static TINKERBELL_MACHINE_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "TinkerbellMachineConfig",
    rules: &[
        FieldRule::labeled("spec.hardwareSelector", "spec.HardwareSelector", Comparison::Exact)
            .with_render(Render::PreviousNew),
        FieldRule::labeled("spec.users[*].name", "spec.Users[{}].Name", Comparison::Exact)
            .with_render(Render::PreviousNew),
        FieldRule::labeled(
            "spec.users[*].sshAuthorizedKeys[*]",
            "spec.Users[{}].SshAuthorizedKeys[{}]",
            Comparison::Exact,
        )
        .with_render(Render::PreviousNew),
        FieldRule::exact("spec.osFamily"),
        FieldRule::mutable("spec.hostOSConfiguration"),
        FieldRule::mutable("spec.templateRef"),
    ],
    collapse: None,
};

/// Tinkerbell provider adapter
pub struct TinkerbellProvider {
    client: Arc<dyn ClusterClient>,
}

impl TinkerbellProvider {
    /// Create an adapter reading existing objects through `client`
    pub fn new(client: Arc<dyn ClusterClient>) -> Self {
        Self { client }
    }

    fn validate_hardware_selectors(desired: &ClusterConfig) -> Vec<Finding> {
        let cluster = desired.cluster_name();
        desired
            .cluster
            .spec
            .machine_config_refs()
            .into_iter()
            .filter_map(|r| match desired.machine_config(&r.name) {
                Some(MachineConfig::Tinkerbell(config)) if config.spec.hardware_selector.is_empty() => {
                    Some(format!(
                        "TinkerbellMachineConfig {}: hardwareSelector must not be empty",
                        r.name
                    ))
                }
                _ => None,
            })
            .map(|msg| provider_finding(&Error::provider_for(&cluster, PROVIDER_NAME, msg)))
            .collect()
    }
}

#[async_trait]
impl ProviderAdapter for TinkerbellProvider {
    fn name(&self) -> &'static str {
        PROVIDER_NAME
    }

    fn datacenter_kind(&self) -> DatacenterKind {
        DatacenterKind::Tinkerbell
    }

    fn datacenter_config(&self, desired: &ClusterConfig) -> Result<DatacenterConfig> {
        desired_datacenter_config(PROVIDER_NAME, self.datacenter_kind(), desired)
    }

    fn datacenter_policy(&self) -> &'static ObjectPolicy {
        &TINKERBELL_DATACENTER_POLICY
    }

    fn machine_config_policy(&self) -> &'static ObjectPolicy {
        &TINKERBELL_MACHINE_POLICY
    }

    async fn validate_new_spec(
        &self,
        target: &TargetCluster,
        desired: &ClusterConfig,
    ) -> Result<Vec<Finding>> {
        let mut findings = diff_provider_configs(self, self.client.as_ref(), target, desired).await?;
        findings.extend(Self::validate_hardware_selectors(desired));
        Ok(findings)
    }
}
