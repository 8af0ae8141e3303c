//! Error types for the strata command line

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by CLI commands before or around a preflight pass
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A file named on the command line could not be read
    #[error("failed to read {}: {source}", path.display())]
    ReadFile {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Configuration, client or engine error
    #[error(transparent)]
    Strata(#[from] strata_common::Error),

    /// Logging could not be initialized
    #[error(transparent)]
    Telemetry(#[from] strata_common::telemetry::TelemetryError),
}

impl Error {
    /// Create a file read error for the given path
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }
}
