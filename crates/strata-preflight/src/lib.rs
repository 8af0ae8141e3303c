//! Preflight validation for cluster upgrades
//!
//! Before an upgrade is applied, a preflight pass checks the running cluster
//! and compares the desired configuration against the one in effect. Every
//! problem found is collected into a single [`ValidationError`]; nothing is
//! mutated on either cluster.
//!
//! # Modules
//!
//! - [`client`] - Read-only access to the management and workload clusters
//! - [`validators`] - Readiness, existence, version and credential checks
//! - [`policy`] - Field mutability tables for cluster-level objects
//! - [`diff`] - Policy-driven comparison of configuration trees
//! - [`immutability`] - Cluster, identity provider and GitOps comparisons
//! - [`provider`] - Per-provider immutability tables and extra checks
//! - [`release`] - Supported Kubernetes versions of a release
//! - [`runner`] - Pass orchestration and finding aggregation

#![deny(missing_docs)]

pub mod client;
pub mod config;
pub mod diff;
pub mod finding;
pub mod immutability;
pub mod policy;
pub mod provider;
pub mod release;
pub mod runner;
pub mod validators;

pub use client::{CapiClusterRef, ClusterClient, KubeClusterClient, TargetCluster};
pub use config::{GitCredentials, PreflightConfig};
pub use finding::{Check, Finding, FindingKind, ValidationError};
pub use provider::{create_provider, ProviderAdapter};
pub use release::{FileReleaseReader, ReleaseReader};
pub use runner::{run_preflight_validations, PreflightOptions, PreflightReport, PreflightRunner};
