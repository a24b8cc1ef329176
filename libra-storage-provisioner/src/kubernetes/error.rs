//! Kubernetes error types
//!
//! Covers failures of both backends: the kubectl child process and kube-rs.

use thiserror::Error;

/// Kubernetes-specific errors
#[derive(Debug, Error)]
pub enum K8sError {
    /// Error from kube-rs client
    #[cfg(feature = "kubernetes")]
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Invalid or unreadable kubeconfig
    #[error("Invalid kubeconfig: {0}")]
    InvalidKubeconfig(String),

    /// kubectl could not be started
    #[error("Failed to run {binary}: {source}")]
    KubectlSpawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    /// kubectl ran and reported a failure
    #[error("kubectl {verb} {resource} failed ({status}): {stderr}")]
    Kubectl {
        verb: String,
        resource: String,
        status: String,
        stderr: String,
    },

    /// Manifest could not be rendered or kubectl output could not be parsed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal system error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_yaml::Error> for K8sError {
    fn from(err: serde_yaml::Error) -> Self {
        K8sError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for K8sError {
    fn from(err: serde_json::Error) -> Self {
        K8sError::Serialization(err.to_string())
    }
}

/// Result type alias for Kubernetes operations
pub type K8sResult<T> = std::result::Result<T, K8sError>;
