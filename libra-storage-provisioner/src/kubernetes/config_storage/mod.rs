//! Kubernetes storage resources through the API
//!
//! Handles PVCs and StorageClasses with server-side apply, and provides the
//! backend that uses them.

pub mod pvcs;
pub mod storageclasses;

use crate::kubernetes::client::K8sClient;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::manifests::Manifest;
use crate::kubernetes::types::{ApplyOutcome, DeleteOutcome, ResourceStatus};
use crate::kubernetes::ClusterBackend;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use libra_storage_common::ResourceKind;

/// Field manager recorded for server-side apply
pub const FIELD_MANAGER: &str = "libra-storage";

/// Classify a server-side apply by comparing resource versions
pub fn apply_outcome(previous: Option<&ObjectMeta>, applied: &ObjectMeta) -> ApplyOutcome {
    match previous {
        None => ApplyOutcome::Created,
        Some(prev) if prev.resource_version.is_some()
            && prev.resource_version == applied.resource_version =>
        {
            ApplyOutcome::Unchanged
        }
        Some(_) => ApplyOutcome::Configured,
    }
}

/// Cluster backend talking to the Kubernetes API directly
#[derive(Debug, Clone)]
pub struct ApiBackend {
    client: K8sClient,
    namespace: Option<String>,
}

impl ApiBackend {
    pub fn new(client: K8sClient, namespace: Option<String>) -> Self {
        Self { client, namespace }
    }
}

#[async_trait]
impl ClusterBackend for ApiBackend {
    fn name(&self) -> &'static str {
        "api"
    }

    async fn apply(&self, manifest: &Manifest) -> K8sResult<ApplyOutcome> {
        match manifest {
            Manifest::StorageClass(sc) => storageclasses::apply_storage_class(&self.client, sc).await,
            Manifest::Claim { pvc, .. } => {
                pvcs::apply_pvc(&self.client, self.namespace.as_deref(), pvc).await
            }
        }
    }

    async fn status(&self, kind: ResourceKind, name: &str) -> K8sResult<ResourceStatus> {
        let status = match kind {
            ResourceKind::StorageClass => storageclasses::get_storage_class(&self.client, name)
                .await?
                .map(ResourceStatus::from),
            ResourceKind::PersistentVolumeClaim => {
                pvcs::get_pvc(&self.client, self.namespace.as_deref(), name)
                    .await?
                    .map(ResourceStatus::from)
            }
        };

        Ok(status.unwrap_or_else(|| ResourceStatus::missing(kind, name)))
    }

    async fn delete(&self, kind: ResourceKind, name: &str) -> K8sResult<DeleteOutcome> {
        match kind {
            ResourceKind::StorageClass => {
                storageclasses::delete_storage_class(&self.client, name).await
            }
            ResourceKind::PersistentVolumeClaim => {
                pvcs::delete_pvc(&self.client, self.namespace.as_deref(), name).await
            }
        }
    }
}
