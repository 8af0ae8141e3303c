//! Core immutability checks
//!
//! Compares the cluster object and the identity provider, GitOps and Flux
//! configs of the existing and desired bundles. Provider datacenter and
//! machine configs are diffed by the provider adapters.

use serde::Serialize;
use serde_json::Value;
use strata_common::crd::{Cluster, AWS_IAM_CONFIG_KIND, OIDC_CONFIG_KIND};
use strata_common::{ClusterConfig, Error, Result};
use tracing::debug;

use crate::diff::{diff_objects, differs};
use crate::finding::{Check, Finding, FindingKind};
use crate::policy::{
    Comparison, IdentityProviderPolicy, CLUSTER_POLICY, FLUX_POLICY, GITOPS_POLICY,
    IDENTITY_PROVIDER_POLICIES, MANAGED_BY_FIELD, SELF_MANAGED_FIELD,
};

/// Serialize an object into the structural form the differ walks
pub fn to_tree<T: Serialize>(kind: &str, object: &T) -> Result<Value> {
    serde_json::to_value(object).map_err(|e| Error::serialization_for_kind(kind, e.to_string()))
}

/// Serialized cluster with the derived management fields added at the top level
pub fn cluster_tree(cluster: &Cluster) -> Result<Value> {
    let mut tree = to_tree(CLUSTER_POLICY.kind, cluster)?;
    if let Value::Object(fields) = &mut tree {
        fields.insert(
            SELF_MANAGED_FIELD.to_string(),
            Value::Bool(cluster.is_self_managed()),
        );
        fields.insert(
            MANAGED_BY_FIELD.to_string(),
            Value::String(cluster.managed_by()),
        );
    }
    Ok(tree)
}

fn violation(message: String) -> Finding {
    Finding::new(
        Check::ImmutableFields,
        FindingKind::ImmutableFieldViolation,
        message,
    )
}

/// Validate that no immutable core field changes between two bundles
///
/// Findings come out cluster first, then identity providers, GitOps and Flux.
/// Attached configs present on only one side are not field-diffed.
pub fn validate_immutable_fields(
    existing: &ClusterConfig,
    desired: &ClusterConfig,
) -> Result<Vec<Finding>> {
    let mut messages = diff_objects(
        &CLUSTER_POLICY,
        &cluster_tree(&existing.cluster)?,
        &cluster_tree(&desired.cluster)?,
    );

    for policy in IDENTITY_PROVIDER_POLICIES {
        messages.extend(identity_provider_violations(policy, existing, desired)?);
    }

    if let (Some(e), Some(d)) = (&existing.gitops_config, &desired.gitops_config) {
        messages.extend(diff_objects(
            &GITOPS_POLICY,
            &to_tree(GITOPS_POLICY.kind, e)?,
            &to_tree(GITOPS_POLICY.kind, d)?,
        ));
    }

    if let (Some(e), Some(d)) = (&existing.flux_config, &desired.flux_config) {
        messages.extend(diff_objects(
            &FLUX_POLICY,
            &to_tree(FLUX_POLICY.kind, e)?,
            &to_tree(FLUX_POLICY.kind, d)?,
        ));
    }

    debug!(
        cluster = %desired.cluster_name(),
        violations = messages.len(),
        "compared immutable fields"
    );
    Ok(messages.into_iter().map(violation).collect())
}

/// Existing/desired config pairs of one identity provider kind, by object name
fn identity_config_pairs(
    kind: &str,
    existing: &ClusterConfig,
    desired: &ClusterConfig,
) -> Result<Vec<(Value, Value)>> {
    let mut pairs = Vec::new();
    if kind == AWS_IAM_CONFIG_KIND {
        if let (Some(e), Some(d)) = (&existing.aws_iam_config, &desired.aws_iam_config) {
            pairs.push((to_tree(kind, e)?, to_tree(kind, d)?));
        }
    } else if kind == OIDC_CONFIG_KIND {
        for (name, d) in &desired.oidc_configs {
            if let Some(e) = existing.oidc_configs.get(name) {
                pairs.push((to_tree(kind, e)?, to_tree(kind, d)?));
            }
        }
    }
    Ok(pairs)
}

fn identity_provider_violations(
    policy: &IdentityProviderPolicy,
    existing: &ClusterConfig,
    desired: &ClusterConfig,
) -> Result<Vec<String>> {
    let refs_of = |config: &ClusterConfig| {
        to_tree(
            policy.kind,
            &config.cluster.spec.identity_provider_refs_of(policy.kind),
        )
    };
    let existing_refs = refs_of(existing)?;
    let desired_refs = refs_of(desired)?;
    let refs_changed = differs(policy.refs, Some(&existing_refs), Some(&desired_refs));

    let mut messages = Vec::new();
    for (e, d) in identity_config_pairs(policy.kind, existing, desired)? {
        messages.extend(diff_objects(policy.config, &e, &d));
    }

    match policy.config.collapse {
        Some(message) if refs_changed || !messages.is_empty() => Ok(vec![message.to_string()]),
        _ => {
            if refs_changed && policy.refs != Comparison::Mutable {
                messages.insert(0, format!("{} identity provider refs are immutable", policy.kind));
            }
            Ok(messages)
        }
    }
}
