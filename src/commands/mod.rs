//! CLI command implementations

pub mod preflight;
