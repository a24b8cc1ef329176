//! Kubernetes integration for the Libra storage provisioner
//!
//! Provides:
//! - Manifest construction and YAML rendering (StorageClass, PVCs)
//! - A kubectl backend that pipes manifests into `kubectl apply -f-`
//! - A Kubernetes API backend using server-side apply (`kubernetes` feature)

pub mod client;
pub mod config_storage;
pub mod error;
pub mod kubectl;
pub mod manifests;
pub mod types;

use async_trait::async_trait;
use error::K8sResult;
use libra_storage_common::ResourceKind;
use manifests::Manifest;
use types::{ApplyOutcome, DeleteOutcome, ResourceStatus};

/// A way of reaching the cluster
///
/// Every call completes before the next one is issued; implementations do
/// not need to be safe for concurrent use of the same resource.
#[async_trait]
pub trait ClusterBackend: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Create or update the resource described by `manifest`
    async fn apply(&self, manifest: &Manifest) -> K8sResult<ApplyOutcome>;

    /// Observed state of a resource; missing resources are not an error
    async fn status(&self, kind: ResourceKind, name: &str) -> K8sResult<ResourceStatus>;

    /// Delete a resource; missing resources are not an error
    async fn delete(&self, kind: ResourceKind, name: &str) -> K8sResult<DeleteOutcome>;
}
