//! GitOps CRDs: the legacy GitHub-only config and the Flux config

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Legacy GitOps configuration (Flux on GitHub only)
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "GitOpsConfig",
    plural = "gitopsconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct GitOpsConfigSpec {
    /// Flux settings
    #[serde(default)]
    pub flux: Flux,
}

/// Flux settings of a legacy GitOps config
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Flux {
    /// GitHub repository settings
    #[serde(default)]
    pub github: Github,
}

/// GitHub repository settings of a legacy GitOps config
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Github {
    /// Namespace Flux is installed into
    #[serde(default)]
    pub flux_system_namespace: String,
    /// Branch Flux syncs from
    #[serde(default)]
    pub branch: String,
    /// Path of the cluster config inside the repository
    #[serde(default)]
    pub cluster_config_path: String,
    /// Repository owner
    #[serde(default)]
    pub owner: String,
    /// Repository name
    #[serde(default)]
    pub repository: String,
    /// Whether the owner is a user rather than an organization
    #[serde(default)]
    pub personal: bool,
}

/// Flux configuration supporting GitHub and generic git providers
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "FluxConfig",
    plural = "fluxconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct FluxConfigSpec {
    /// Namespace Flux is installed into
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub system_namespace: String,
    /// Path of the cluster config inside the repository
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cluster_config_path: String,
    /// Branch Flux syncs from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,
    /// GitHub provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubProviderConfig>,
    /// Generic git provider over SSH
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitProviderConfig>,
}

/// GitHub provider settings of a Flux config
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GithubProviderConfig {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repository: String,
    /// Whether the owner is a user rather than an organization
    #[serde(default)]
    pub personal: bool,
}

/// Generic git provider settings of a Flux config
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GitProviderConfig {
    /// SSH URL of the repository
    pub repository_url: String,
    /// Key algorithm of the SSH key used by Flux
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ssh_key_algorithm: String,
}
