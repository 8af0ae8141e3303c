//! Identity provider CRDs attached to a cluster's API server

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// OpenID Connect authentication for the API server
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "OIDCConfig",
    plural = "oidcconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct OIDCConfigSpec {
    /// OAuth client ID
    pub client_id: String,
    /// Claim holding the user's groups
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub groups_claim: String,
    /// Prefix prepended to group names
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub groups_prefix: String,
    /// Issuer URL
    pub issuer_url: String,
    /// Claims a token must carry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_claims: Vec<OidcRequiredClaim>,
    /// Claim used as the user name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username_claim: String,
    /// Prefix prepended to user names
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username_prefix: String,
}

/// A claim/value pair required in OIDC tokens
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OidcRequiredClaim {
    /// Claim name
    pub claim: String,
    /// Required value
    pub value: String,
}

/// AWS IAM authenticator for the API server
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "anywhere.strata.dev",
    version = "v1alpha1",
    kind = "AWSIamConfig",
    plural = "awsiamconfigs",
    namespaced,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct AWSIamConfigSpec {
    /// AWS region of the IAM authenticator
    pub aws_region: String,
    /// Authenticator backend modes, in priority order
    #[serde(default)]
    pub backend_mode: Vec<String>,
    /// IAM roles mapped to Kubernetes identities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_roles: Vec<MapRoles>,
    /// IAM users mapped to Kubernetes identities
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub map_users: Vec<MapUsers>,
    /// AWS partition
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub partition: String,
}

/// IAM role mapping
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapRoles {
    /// Role ARN
    #[serde(rename = "roleARN")]
    pub role_arn: String,
    /// Kubernetes user name
    pub username: String,
    /// Kubernetes groups
    #[serde(default)]
    pub groups: Vec<String>,
}

/// IAM user mapping
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MapUsers {
    /// User ARN
    #[serde(rename = "userARN")]
    pub user_arn: String,
    /// Kubernetes user name
    pub username: String,
    /// Kubernetes groups
    #[serde(default)]
    pub groups: Vec<String>,
}
