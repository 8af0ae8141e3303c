//! Integration tests for upgrade preflight validation
//!
//! # Test Organization
//!
//! - `fake_cluster`: an in-memory [`strata_preflight::ClusterClient`] that
//!   serves an existing configuration and canned health state
//!
//! - `fixtures`: desired and existing cluster configurations as YAML
//!
//! - `scenarios`: stories about upgrades that pass, upgrades that are
//!   rejected and passes that abort

mod fake_cluster;
mod fixtures;
mod scenarios;
