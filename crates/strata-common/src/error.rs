//! Error types for strata
//!
//! Errors are structured with fields to aid debugging. The preflight engine
//! splits them in two families: fatal errors mean the state of the cluster is
//! unknown (transport failures, cancellation, deadline expiry) and abort a
//! validation pass; every other error is a statement about the cluster and is
//! downgraded to a finding.

use std::time::Duration;

use thiserror::Error;

/// Default context value when no specific context is available
pub const UNKNOWN_CONTEXT: &str = "unknown";

/// Main error type for strata operations
#[derive(Debug, Error)]
pub enum Error {
    /// Kubernetes API error
    #[error("kubernetes error: {source}")]
    Kube {
        /// The underlying kube-rs error
        #[from]
        source: kube::Error,
    },

    /// A required object does not exist on the cluster
    #[error("{kind} {name} not found")]
    NotFound {
        /// Kind of the missing object (e.g., "Cluster", "VSphereMachineConfig")
        kind: String,
        /// Name of the missing object
        name: String,
    },

    /// A readiness check returned a negative result
    ///
    /// Displays the message verbatim so it can be surfaced as-is.
    #[error("{message}")]
    NotReady {
        /// Human-readable readiness failure
        message: String,
    },

    /// Validation error for a cluster specification
    #[error("validation error for {cluster}: {message}")]
    Validation {
        /// Name of the cluster with invalid configuration
        cluster: String,
        /// Description of what's invalid
        message: String,
        /// The invalid field path (e.g., "spec.kubernetesVersion")
        field: Option<String>,
    },

    /// Infrastructure provider error
    #[error("provider error [{provider}] for {cluster}: {message}")]
    Provider {
        /// Name of the cluster being validated
        cluster: String,
        /// Provider name (vsphere, tinkerbell, cloudstack)
        provider: String,
        /// Description of what failed
        message: String,
    },

    /// Serialization/deserialization error
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of what failed
        message: String,
        /// The resource kind being serialized (if known)
        kind: Option<String>,
    },

    /// The operation was cancelled by the caller
    #[error("{operation} was cancelled")]
    Cancelled {
        /// The operation that was cancelled
        operation: String,
    },

    /// The operation did not finish before its deadline
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        /// The operation that timed out
        operation: String,
        /// The deadline that expired
        after: Duration,
    },

    /// Internal/operational error
    #[error("internal error [{context}]: {message}")]
    Internal {
        /// Description of what failed
        message: String,
        /// Context where the error occurred (e.g., "create_client", "discovery")
        context: String,
    },
}

impl Error {
    /// Create a validation error with the given message
    ///
    /// For simple validation errors without cluster context.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            cluster: UNKNOWN_CONTEXT.to_string(),
            message: msg.into(),
            field: None,
        }
    }

    /// Create a validation error with cluster context and field path
    pub fn validation_for_field(
        cluster: impl Into<String>,
        field: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Validation {
            cluster: cluster.into(),
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a not-found error for an object of the given kind
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a readiness failure carrying a message that is surfaced verbatim
    pub fn not_ready(msg: impl Into<String>) -> Self {
        Self::NotReady {
            message: msg.into(),
        }
    }

    /// Create a provider error with full context
    pub fn provider_for(
        cluster: impl Into<String>,
        provider: impl Into<String>,
        msg: impl Into<String>,
    ) -> Self {
        Self::Provider {
            cluster: cluster.into(),
            provider: provider.into(),
            message: msg.into(),
        }
    }

    /// Create a serialization error with the given message
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: None,
        }
    }

    /// Create a serialization error with resource kind context
    pub fn serialization_for_kind(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Serialization {
            message: msg.into(),
            kind: Some(kind.into()),
        }
    }

    /// Create a cancellation error for the given operation
    pub fn cancelled(operation: impl Into<String>) -> Self {
        Self::Cancelled {
            operation: operation.into(),
        }
    }

    /// Create a deadline error for the given operation
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// Create an internal error with the given message
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: UNKNOWN_CONTEXT.to_string(),
        }
    }

    /// Create an internal error with context
    pub fn internal_with_context(context: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Internal {
            message: msg.into(),
            context: context.into(),
        }
    }

    /// Check if this error means the cluster state could not be observed
    ///
    /// Fatal errors abort a validation pass. Kubernetes 404s are not fatal:
    /// they describe the cluster rather than the connection to it.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Kube { source } => !matches!(
                source,
                kube::Error::Api(ae) if ae.code == 404
            ),
            Error::Cancelled { .. } | Error::Timeout { .. } | Error::Internal { .. } => true,
            Error::NotFound { .. }
            | Error::NotReady { .. }
            | Error::Validation { .. }
            | Error::Provider { .. }
            | Error::Serialization { .. } => false,
        }
    }

}
