//! Cluster configuration bundles
//!
//! A [`ClusterConfig`] is a `Cluster` object together with every object it
//! references. It is assembled either from a multi-document YAML file (the
//! desired configuration) or by fetching objects from a live cluster (the
//! existing configuration).

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::crd::{
    AWSIamConfig, CloudStackDatacenterConfig, CloudStackMachineConfig, Cluster, DatacenterConfig,
    DatacenterKind, FluxConfig, GitOpsConfig, MachineConfig, OIDCConfig,
    TinkerbellDatacenterConfig, TinkerbellMachineConfig, VSphereDatacenterConfig,
    VSphereMachineConfig, AWS_IAM_CONFIG_KIND, CLOUDSTACK_DATACENTER_CONFIG_KIND,
    CLOUDSTACK_MACHINE_CONFIG_KIND, CLUSTER_KIND, FLUX_CONFIG_KIND, GITOPS_CONFIG_KIND,
    OIDC_CONFIG_KIND, TINKERBELL_DATACENTER_CONFIG_KIND, TINKERBELL_MACHINE_CONFIG_KIND,
    VSPHERE_DATACENTER_CONFIG_KIND, VSPHERE_MACHINE_CONFIG_KIND,
};
use crate::{Error, Result};

/// A cluster object and the configuration objects attached to it
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterConfig {
    /// The root cluster object
    pub cluster: Cluster,
    /// Provider datacenter config
    pub datacenter_config: Option<DatacenterConfig>,
    /// Provider machine configs keyed by object name
    pub machine_configs: BTreeMap<String, MachineConfig>,
    /// OIDC identity provider configs keyed by object name
    pub oidc_configs: BTreeMap<String, OIDCConfig>,
    /// AWS IAM identity provider config
    pub aws_iam_config: Option<AWSIamConfig>,
    /// Legacy GitOps config
    pub gitops_config: Option<GitOpsConfig>,
    /// Flux config
    pub flux_config: Option<FluxConfig>,
}

impl ClusterConfig {
    /// Create a bundle holding only the cluster object
    pub fn new(cluster: Cluster) -> Self {
        Self {
            cluster,
            datacenter_config: None,
            machine_configs: BTreeMap::new(),
            oidc_configs: BTreeMap::new(),
            aws_iam_config: None,
            gitops_config: None,
            flux_config: None,
        }
    }

    /// Name of the cluster
    pub fn cluster_name(&self) -> String {
        self.cluster.cluster_name()
    }

    /// Namespace of the cluster object, "default" when unset
    pub fn namespace(&self) -> String {
        self.cluster
            .metadata
            .namespace
            .clone()
            .unwrap_or_else(|| "default".to_string())
    }

    /// Kubernetes version of the control plane
    pub fn kubernetes_version(&self) -> &str {
        &self.cluster.spec.kubernetes_version
    }

    /// Provider family named by the cluster's datacenter ref
    pub fn datacenter_kind(&self) -> Result<DatacenterKind> {
        let kind = &self.cluster.spec.datacenter_ref.kind;
        DatacenterKind::from_datacenter_kind(kind).ok_or_else(|| {
            Error::validation_for_field(
                self.cluster_name(),
                "spec.datacenterRef.kind",
                format!("unsupported datacenter kind: {kind}"),
            )
        })
    }

    /// Machine config by object name
    pub fn machine_config(&self, name: &str) -> Option<&MachineConfig> {
        self.machine_configs.get(name)
    }

    /// Parse a multi-document YAML cluster configuration
    ///
    /// Every document must carry a known `kind`, and exactly one `Cluster`
    /// document must be present. Empty documents are skipped.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut cluster: Option<Cluster> = None;
        let mut datacenter_config = None;
        let mut machine_configs = BTreeMap::new();
        let mut oidc_configs = BTreeMap::new();
        let mut aws_iam_config = None;
        let mut gitops_config = None;
        let mut flux_config = None;

        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document)
                .map_err(|e| Error::serialization(format!("invalid YAML document: {e}")))?;
            if value.is_null() {
                continue;
            }
            let kind = value
                .get("kind")
                .and_then(|k| k.as_str())
                .ok_or_else(|| Error::serialization("YAML document is missing `kind`"))?
                .to_string();

            match kind.as_str() {
                CLUSTER_KIND => {
                    if cluster.is_some() {
                        return Err(Error::serialization_for_kind(
                            CLUSTER_KIND,
                            "multiple Cluster documents found",
                        ));
                    }
                    cluster = Some(parse_document(&kind, value)?);
                }
                VSPHERE_DATACENTER_CONFIG_KIND => {
                    datacenter_config = Some(DatacenterConfig::VSphere(
                        parse_document::<VSphereDatacenterConfig>(&kind, value)?,
                    ));
                }
                TINKERBELL_DATACENTER_CONFIG_KIND => {
                    datacenter_config = Some(DatacenterConfig::Tinkerbell(
                        parse_document::<TinkerbellDatacenterConfig>(&kind, value)?,
                    ));
                }
                CLOUDSTACK_DATACENTER_CONFIG_KIND => {
                    datacenter_config = Some(DatacenterConfig::CloudStack(
                        parse_document::<CloudStackDatacenterConfig>(&kind, value)?,
                    ));
                }
                VSPHERE_MACHINE_CONFIG_KIND => {
                    let config = MachineConfig::VSphere(parse_document::<VSphereMachineConfig>(
                        &kind, value,
                    )?);
                    machine_configs.insert(config.name(), config);
                }
                TINKERBELL_MACHINE_CONFIG_KIND => {
                    let config = MachineConfig::Tinkerbell(
                        parse_document::<TinkerbellMachineConfig>(&kind, value)?,
                    );
                    machine_configs.insert(config.name(), config);
                }
                CLOUDSTACK_MACHINE_CONFIG_KIND => {
                    let config = MachineConfig::CloudStack(
                        parse_document::<CloudStackMachineConfig>(&kind, value)?,
                    );
                    machine_configs.insert(config.name(), config);
                }
                OIDC_CONFIG_KIND => {
                    let config: OIDCConfig = parse_document(&kind, value)?;
                    oidc_configs.insert(kube::ResourceExt::name_any(&config), config);
                }
                AWS_IAM_CONFIG_KIND => aws_iam_config = Some(parse_document(&kind, value)?),
                GITOPS_CONFIG_KIND => gitops_config = Some(parse_document(&kind, value)?),
                FLUX_CONFIG_KIND => flux_config = Some(parse_document(&kind, value)?),
                other => {
                    return Err(Error::serialization_for_kind(
                        other,
                        format!("unsupported kind in cluster configuration: {other}"),
                    ))
                }
            }
        }

        let cluster = cluster.ok_or_else(|| {
            Error::serialization_for_kind(CLUSTER_KIND, "no Cluster document found")
        })?;

        Ok(Self {
            cluster,
            datacenter_config,
            machine_configs,
            oidc_configs,
            aws_iam_config,
            gitops_config,
            flux_config,
        })
    }
}

fn parse_document<T: DeserializeOwned>(kind: &str, value: serde_yaml::Value) -> Result<T> {
    serde_yaml::from_value(value)
        .map_err(|e| Error::serialization_for_kind(kind, format!("failed to parse {kind}: {e}")))
}
