//! Infrastructure provider adapters
//!
//! Each infrastructure backend implements [`ProviderAdapter`]: it knows which
//! datacenter and machine config kinds it owns, carries their immutability
//! tables and runs its own extra checks against a desired configuration.
//!
//! # Supported Providers
//!
//! - [`VSphereProvider`] - virtualization platform
//! - [`TinkerbellProvider`] - bare metal
//! - [`CloudStackProvider`] - cloud substrate

mod cloudstack;
mod tinkerbell;
mod vsphere;

pub use cloudstack::{CloudStackProvider, CLOUDSTACK_DATACENTER_POLICY, CLOUDSTACK_MACHINE_POLICY};
pub use tinkerbell::{TinkerbellProvider, TINKERBELL_DATACENTER_POLICY, TINKERBELL_MACHINE_POLICY};
pub use vsphere::{VSphereProvider, VSPHERE_DATACENTER_POLICY, VSPHERE_MACHINE_POLICY};

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use strata_common::crd::{DatacenterConfig, DatacenterKind};
use strata_common::{ClusterConfig, Error, Result};
use tracing::debug;

use crate::client::{ClusterClient, TargetCluster};
use crate::diff::diff_objects;
use crate::finding::{Check, Finding, FindingKind};
use crate::policy::ObjectPolicy;
use crate::validators::optional_object;

/// Capability surface of one infrastructure backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Short provider name used in logs and messages
    fn name(&self) -> &'static str;

    /// Provider family this adapter serves
    fn datacenter_kind(&self) -> DatacenterKind;

    /// The desired datacenter config, checked to belong to this provider
    fn datacenter_config(&self, desired: &ClusterConfig) -> Result<DatacenterConfig>;

    /// Immutability table of the datacenter config
    fn datacenter_policy(&self) -> &'static ObjectPolicy;

    /// Immutability table of machine configs
    fn machine_config_policy(&self) -> &'static ObjectPolicy;

    /// Validate a desired configuration against what runs on the target
    ///
    /// Returns findings in datacenter, machine configs by name, extras order.
    /// Only fatal errors are returned as `Err`.
    async fn validate_new_spec(
        &self,
        target: &TargetCluster,
        desired: &ClusterConfig,
    ) -> Result<Vec<Finding>>;
}

/// Build the adapter for a provider family
pub fn create_provider(kind: DatacenterKind, client: Arc<dyn ClusterClient>) -> Box<dyn ProviderAdapter> {
    match kind {
        DatacenterKind::VSphere => Box::new(VSphereProvider::new(client)),
        DatacenterKind::Tinkerbell => Box::new(TinkerbellProvider::new(client)),
        DatacenterKind::CloudStack => Box::new(CloudStackProvider::new(client)),
    }
}

/// The desired datacenter config if it belongs to the given provider family
pub(crate) fn desired_datacenter_config(
    provider: &'static str,
    kind: DatacenterKind,
    desired: &ClusterConfig,
) -> Result<DatacenterConfig> {
    let expected = kind.datacenter_config_kind();
    let reference = &desired.cluster.spec.datacenter_ref;
    match &desired.datacenter_config {
        Some(config) if config.kind() == kind && config.name() == reference.name => {
            Ok(config.clone())
        }
        Some(config) if config.kind() != kind => Err(Error::provider_for(
            desired.cluster_name(),
            provider,
            format!(
                "expected {expected}, got {}",
                config.kind().datacenter_config_kind()
            ),
        )),
        _ => Err(Error::provider_for(
            desired.cluster_name(),
            provider,
            format!("{expected} {} is not defined", reference.name),
        )),
    }
}

pub(crate) fn provider_finding(err: &Error) -> Finding {
    Finding::from_error(Check::ProviderSpec, FindingKind::InvalidProviderSpec, err)
}

fn immutable_finding(message: String) -> Finding {
    Finding::new(
        Check::ProviderSpec,
        FindingKind::ImmutableFieldViolation,
        message,
    )
}

/// Read an existing object, turning absence into `None`
async fn read_existing<T, F>(
    fetch: F,
    kind: &str,
    name: &str,
    findings: &mut Vec<Finding>,
) -> Result<Option<T>>
where
    F: Future<Output = Result<T>>,
{
    optional_object(fetch.await, Check::ProviderSpec, kind, name, findings)
}

/// Diff the desired datacenter and machine configs against the existing ones
///
/// Existing objects are looked up by the names the desired cluster references.
/// Objects the cluster does not have yet are new and not compared.
pub(crate) async fn diff_provider_configs<P>(
    provider: &P,
    client: &dyn ClusterClient,
    target: &TargetCluster,
    desired: &ClusterConfig,
) -> Result<Vec<Finding>>
where
    P: ProviderAdapter + ?Sized,
{
    let mut findings = Vec::new();
    let namespace = desired.namespace();
    let kind = provider.datacenter_kind();

    match provider.datacenter_config(desired) {
        Ok(config) => {
            let name = config.name();
            let existing = read_existing(
                client.get_datacenter_config(target, &namespace, kind, &name),
                kind.datacenter_config_kind(),
                &name,
                &mut findings,
            )
            .await?;
            if let Some(existing) = existing {
                findings.extend(
                    diff_objects(provider.datacenter_policy(), &existing.to_value()?, &config.to_value()?)
                        .into_iter()
                        .map(immutable_finding),
                );
            }
        }
        Err(e) if e.is_fatal() => return Err(e),
        Err(e) => findings.push(provider_finding(&e)),
    }

    let names: BTreeSet<&str> = desired
        .cluster
        .spec
        .machine_config_refs()
        .into_iter()
        .map(|r| r.name.as_str())
        .collect();

    for name in names {
        let Some(config) = desired.machine_config(name) else {
            continue;
        };
        if config.kind() != kind {
            continue;
        }
        let existing = read_existing(
            client.get_machine_config(target, &namespace, kind, name),
            kind.machine_config_kind(),
            name,
            &mut findings,
        )
        .await?;
        if let Some(existing) = existing {
            findings.extend(
                diff_objects(provider.machine_config_policy(), &existing.to_value()?, &config.to_value()?)
                    .into_iter()
                    .map(immutable_finding),
            );
        }
    }

    debug!(
        provider = provider.name(),
        cluster = %desired.cluster_name(),
        findings = findings.len(),
        "compared provider configs"
    );
    Ok(findings)
}
