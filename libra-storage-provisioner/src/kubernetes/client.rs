//! Kubernetes client wrapper
//!
//! Wraps the kube-rs Client with the kubeconfig context it was built from.

#[cfg(feature = "kubernetes")]
use kube::{Client, Config};

use super::error::{K8sError, K8sResult};
use crate::config::KubectlConfig;

/// Wrapper around kube-rs Client with cluster context
#[derive(Clone)]
pub struct K8sClient {
    #[cfg(feature = "kubernetes")]
    inner: Client,
    context: Option<String>,
    api_server: String,
}

impl K8sClient {
    /// Connect using the same kubeconfig and context kubectl would be given.
    ///
    /// Without an explicit kubeconfig the standard resolution applies:
    /// `KUBECONFIG`, `~/.kube/config`, then in-cluster configuration.
    #[cfg(feature = "kubernetes")]
    pub async fn connect(config: &KubectlConfig) -> K8sResult<Self> {
        use kube::config::{KubeConfigOptions, Kubeconfig};

        let options = KubeConfigOptions {
            context: config.context.clone(),
            ..Default::default()
        };

        let client_config = match &config.kubeconfig {
            Some(path) => {
                let kubeconfig = Kubeconfig::read_from(path).map_err(|e| {
                    K8sError::InvalidKubeconfig(format!(
                        "Failed to read {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .map_err(|e| {
                        K8sError::InvalidKubeconfig(format!("Failed to create config: {}", e))
                    })?
            }
            None if config.context.is_some() => Config::from_kubeconfig(&options)
                .await
                .map_err(|e| {
                    K8sError::InvalidKubeconfig(format!("Failed to create config: {}", e))
                })?,
            None => Config::infer().await.map_err(|e| {
                K8sError::InvalidKubeconfig(format!("Failed to infer config: {}", e))
            })?,
        };

        let api_server = client_config.cluster_url.to_string();

        let client = Client::try_from(client_config)
            .map_err(|e| K8sError::InvalidKubeconfig(format!("Failed to create client: {}", e)))?;

        tracing::debug!(api_server = %api_server, context = ?config.context, "Connected to cluster");

        Ok(Self {
            inner: client,
            context: config.context.clone(),
            api_server,
        })
    }

    /// Wrap an already configured client
    #[cfg(feature = "kubernetes")]
    pub fn from_client(client: Client, api_server: impl Into<String>) -> Self {
        Self {
            inner: client,
            context: None,
            api_server: api_server.into(),
        }
    }

    /// Get the inner kube-rs Client
    #[cfg(feature = "kubernetes")]
    pub fn inner(&self) -> &Client {
        &self.inner
    }

    /// Get the kubeconfig context, if one was selected explicitly
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Get API server URL
    pub fn api_server(&self) -> &str {
        &self.api_server
    }

    // Stub implementation when kubernetes feature is not enabled
    #[cfg(not(feature = "kubernetes"))]
    pub async fn connect(_config: &KubectlConfig) -> K8sResult<Self> {
        Err(K8sError::Internal(
            "Kubernetes feature not enabled".to_string(),
        ))
    }
}

impl std::fmt::Debug for K8sClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("K8sClient")
            .field("context", &self.context)
            .field("api_server", &self.api_server)
            .finish()
    }
}
