//! Immutability policy tables
//!
//! A policy is data: each object kind gets a static table of [`FieldRule`]s
//! addressing its serialized form by dotted path. The differ walks any table
//! the same way, so adding a provider or a field never touches the walker.
//!
//! Paths use `[*]` after a field to visit every element of a sequence. Labels
//! use `{}` placeholders that are filled with the visited indices in order.

use strata_common::crd::{AWS_IAM_CONFIG_KIND, OIDC_CONFIG_KIND};

/// How existing and desired values of a field are compared
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    /// Deep structural equality
    Exact,
    /// Element-wise equality of a sequence, order significant
    OrderedSlice,
    /// Equality of a sequence as a multiset, order ignored
    UnorderedSet,
    /// Only the transition between absent and present is checked
    Presence,
    /// Explicitly allowed to change
    Mutable,
}

/// How a violation is rendered
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Render {
    /// `<label> is immutable`
    Immutable,
    /// `<label> is immutable. Previous value <existing>, New value <desired>`
    PreviousNew,
    /// `<label> is immutable; previous = <existing>, new = <desired>`
    InlinePreviousNew,
    /// `<label> is immutable. previous = <existing>, new = <desired>`
    SentencePreviousNew,
    /// A fixed message
    Message(&'static str),
}

/// Policy for one field path
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldRule {
    /// Dotted path into the serialized object
    pub path: &'static str,
    /// Name used in messages, with `{}` per `[*]` in the path
    pub label: &'static str,
    /// Comparison applied at the path
    pub comparison: Comparison,
    /// Message shape
    pub render: Render,
    /// Skip this rule when the field at this path already differs
    pub suppressed_by: Option<&'static str>,
}

impl FieldRule {
    /// Exact-equality rule whose label is its path
    pub const fn exact(path: &'static str) -> Self {
        Self::labeled(path, path, Comparison::Exact)
    }

    /// Rule with an explicit label
    pub const fn labeled(path: &'static str, label: &'static str, comparison: Comparison) -> Self {
        Self {
            path,
            label,
            comparison,
            render: Render::Immutable,
            suppressed_by: None,
        }
    }

    /// Field explicitly allowed to change
    pub const fn mutable(path: &'static str) -> Self {
        Self::labeled(path, path, Comparison::Mutable)
    }

    /// Absent/present transition rule with a fixed message
    pub const fn presence(path: &'static str, message: &'static str) -> Self {
        Self::labeled(path, path, Comparison::Presence).with_render(Render::Message(message))
    }

    /// Replace the message shape
    pub const fn with_render(mut self, render: Render) -> Self {
        self.render = render;
        self
    }

    /// Skip the rule when the field at `path` already differs
    pub const fn suppressed_by(mut self, path: &'static str) -> Self {
        self.suppressed_by = Some(path);
        self
    }

    /// Whether the rule reports anything at all
    pub fn is_enforced(&self) -> bool {
        self.comparison != Comparison::Mutable
    }
}

/// All rules for one object kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectPolicy {
    /// Object kind the table applies to
    pub kind: &'static str,
    /// Field rules, in report order
    pub rules: &'static [FieldRule],
    /// When set, any number of violations collapse into this single message
    pub collapse: Option<&'static str>,
}

impl ObjectPolicy {
    /// Rule for an exact path, if declared
    pub fn rule(&self, path: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|r| r.path == path)
    }

    /// Rules that can produce violations
    pub fn enforced_rules(&self) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(|r| r.is_enforced())
    }
}

// =============================================================================
// Cluster
// =============================================================================

/// Synthetic field holding whether the cluster manages itself
pub const SELF_MANAGED_FIELD: &str = "selfManaged";
/// Synthetic field holding the effective management cluster name
pub const MANAGED_BY_FIELD: &str = "managedBy";

/// Core cluster object
///
/// Applied to the cluster serialized with [`SELF_MANAGED_FIELD`] and
/// [`MANAGED_BY_FIELD`] added at the top level.
pub static CLUSTER_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "Cluster",
    rules: &[
        FieldRule::exact("spec.controlPlaneConfiguration.endpoint"),
        FieldRule::labeled(
            "spec.clusterNetwork.pods",
            "spec.clusterNetwork.Pods",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.clusterNetwork.services",
            "spec.clusterNetwork.Services",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.clusterNetwork.dns",
            "spec.clusterNetwork.DNS",
            Comparison::Exact,
        ),
        FieldRule::exact("spec.proxyConfiguration"),
        FieldRule::exact("spec.datacenterRef"),
        FieldRule::exact("spec.gitOpsRef"),
        FieldRule::presence(
            "spec.externalEtcdConfiguration",
            "adding or removing external etcd during upgrade is not supported",
        ),
        FieldRule::exact(SELF_MANAGED_FIELD)
            .with_render(Render::Message("management flag is immutable")),
        FieldRule::exact(MANAGED_BY_FIELD)
            .with_render(Render::Message("management cluster name is immutable"))
            .suppressed_by(SELF_MANAGED_FIELD),
        FieldRule::mutable("spec.kubernetesVersion"),
        FieldRule::mutable("spec.controlPlaneConfiguration.count"),
        FieldRule::mutable("spec.controlPlaneConfiguration.machineGroupRef"),
        FieldRule::mutable("spec.controlPlaneConfiguration.kubeletConfiguration"),
        FieldRule::mutable("spec.workerNodeGroupConfigurations"),
        FieldRule::mutable("spec.identityProviderRefs"),
        FieldRule::mutable("spec.bundlesRef"),
        FieldRule::mutable("spec.eksaVersion"),
    ],
    collapse: None,
};

// =============================================================================
// Identity providers
// =============================================================================

/// AWS IAM authenticator config
pub static AWS_IAM_POLICY: ObjectPolicy = ObjectPolicy {
    kind: AWS_IAM_CONFIG_KIND,
    rules: &[
        FieldRule::exact("spec.awsRegion"),
        FieldRule::labeled("spec.backendMode", "spec.backendMode", Comparison::OrderedSlice),
        FieldRule::exact("spec.partition"),
        FieldRule::mutable("spec.mapRoles"),
        FieldRule::mutable("spec.mapUsers"),
    ],
    collapse: Some("aws iam identity provider is immutable"),
};

/// OIDC config; every field may change
pub static OIDC_POLICY: ObjectPolicy = ObjectPolicy {
    kind: OIDC_CONFIG_KIND,
    rules: &[
        FieldRule::mutable("spec.clientId"),
        FieldRule::mutable("spec.groupsClaim"),
        FieldRule::mutable("spec.groupsPrefix"),
        FieldRule::mutable("spec.issuerUrl"),
        FieldRule::mutable("spec.requiredClaims"),
        FieldRule::mutable("spec.usernameClaim"),
        FieldRule::mutable("spec.usernamePrefix"),
    ],
    collapse: None,
};

/// Policy for one identity provider kind
#[derive(Clone, Copy, Debug)]
pub struct IdentityProviderPolicy {
    /// Identity provider config kind
    pub kind: &'static str,
    /// How the cluster's refs of this kind are compared
    pub refs: Comparison,
    /// Policy applied to configs present on both sides
    pub config: &'static ObjectPolicy,
}

/// Identity provider policies, in report order
pub static IDENTITY_PROVIDER_POLICIES: &[IdentityProviderPolicy] = &[
    IdentityProviderPolicy {
        kind: AWS_IAM_CONFIG_KIND,
        refs: Comparison::UnorderedSet,
        config: &AWS_IAM_POLICY,
    },
    IdentityProviderPolicy {
        kind: OIDC_CONFIG_KIND,
        refs: Comparison::Mutable,
        config: &OIDC_POLICY,
    },
];

// =============================================================================
// GitOps
// =============================================================================

/// Legacy GitHub GitOps config
pub static GITOPS_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "GitOpsConfig",
    rules: &[
        FieldRule::labeled(
            "spec.flux.github.fluxSystemNamespace",
            "gitOps spec.flux.github.fluxSystemNamespace",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.flux.github.branch",
            "gitOps spec.flux.github.branch",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.flux.github.owner",
            "gitOps spec.flux.github.owner",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.flux.github.repository",
            "gitOps spec.flux.github.repository",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.flux.github.clusterConfigPath",
            "gitOps spec.flux.github.clusterConfigPath",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.flux.github.personal",
            "gitOps spec.flux.github.personal",
            Comparison::Exact,
        ),
    ],
    collapse: None,
};

/// Flux config
pub static FLUX_POLICY: ObjectPolicy = ObjectPolicy {
    kind: "FluxConfig",
    rules: &[
        FieldRule::labeled(
            "spec.git.repositoryUrl",
            "fluxConfig spec.fluxConfig.spec.git.repositoryUrl",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.git.sshKeyAlgorithm",
            "fluxConfig spec.fluxConfig.spec.git.sshKeyAlgorithm",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.github.owner",
            "fluxConfig spec.fluxConfig.spec.github.owner",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.github.repository",
            "fluxConfig spec.fluxConfig.spec.github.repository",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.github.personal",
            "fluxConfig spec.fluxConfig.spec.github.personal",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.branch",
            "fluxConfig spec.fluxConfig.spec.branch",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.clusterConfigPath",
            "fluxConfig spec.fluxConfig.spec.clusterConfigPath",
            Comparison::Exact,
        ),
        FieldRule::labeled(
            "spec.systemNamespace",
            "fluxConfig spec.fluxConfig.spec.systemNamespace",
            Comparison::Exact,
        ),
    ],
    collapse: None,
};
