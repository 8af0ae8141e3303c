//! Strata - upgrade preflight validation for multi-provider Kubernetes clusters
//!
//! The `strata` binary wires the preflight engine in [`strata_preflight`] to
//! live clusters. This library holds the command implementations so they can
//! be driven with any [`strata_preflight::ClusterClient`].
//!
//! # Modules
//!
//! - [`commands`] - CLI command implementations
//! - [`error`] - Error types for the command line

#![deny(missing_docs)]

pub mod commands;
pub mod error;

pub use error::Error;

/// Result type alias using the CLI error type
pub type Result<T> = std::result::Result<T, Error>;
