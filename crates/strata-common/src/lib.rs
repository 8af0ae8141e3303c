//! Common types for strata: CRDs, errors, and Kubernetes utilities

#![deny(missing_docs)]

pub mod crd;
pub mod error;
pub mod kube_utils;
pub mod spec;
pub mod telemetry;
pub mod version;

pub use error::Error;
pub use spec::ClusterConfig;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Name of the CRD that must be installed for the `Cluster` kind
pub const CLUSTERS_CRD_NAME: &str = "clusters.anywhere.strata.dev";
