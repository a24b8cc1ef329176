//! Command handlers

pub mod apply;
pub mod config;
pub mod render;
pub mod status;
pub mod teardown;

use crate::Backend;
use anyhow::Result;
use libra_storage_provisioner::kubernetes::client::K8sClient;
use libra_storage_provisioner::kubernetes::config_storage::ApiBackend;
use libra_storage_provisioner::kubernetes::kubectl::KubectlBackend;
use libra_storage_provisioner::kubernetes::ClusterBackend;
use libra_storage_provisioner::{FailurePolicy, ProvisionConfig};

/// Connect the selected backend
pub async fn build_backend(
    config: &ProvisionConfig,
    backend: Backend,
) -> Result<Box<dyn ClusterBackend>> {
    let namespace = config.claims.namespace.clone();

    match backend {
        Backend::Kubectl => Ok(Box::new(KubectlBackend::new(&config.kubectl, namespace))),
        Backend::Api => {
            let client = K8sClient::connect(&config.kubectl).await?;
            tracing::info!(
                api_server = client.api_server(),
                context = ?client.context(),
                "Using Kubernetes API"
            );
            Ok(Box::new(ApiBackend::new(client, namespace)))
        }
    }
}

pub fn failure_policy(keep_going: bool) -> FailurePolicy {
    if keep_going {
        FailurePolicy::KeepGoing
    } else {
        FailurePolicy::FailFast
    }
}
