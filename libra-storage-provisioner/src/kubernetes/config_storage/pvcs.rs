//! PersistentVolumeClaim operations
//!
//! Apply, get and delete for the node volume claims.

use crate::kubernetes::client::K8sClient;
#[cfg(not(feature = "kubernetes"))]
use crate::kubernetes::error::K8sError;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::types::{ApplyOutcome, DeleteOutcome, PvcInfo};
use k8s_openapi::api::core::v1::PersistentVolumeClaim;

#[cfg(feature = "kubernetes")]
fn claims_api(client: &K8sClient, namespace: Option<&str>) -> kube::Api<PersistentVolumeClaim> {
    match namespace {
        Some(ns) => kube::Api::namespaced(client.inner().clone(), ns),
        None => kube::Api::default_namespaced(client.inner().clone()),
    }
}

/// Create or update a PVC with server-side apply
#[cfg(feature = "kubernetes")]
pub async fn apply_pvc(
    client: &K8sClient,
    namespace: Option<&str>,
    pvc: &PersistentVolumeClaim,
) -> K8sResult<ApplyOutcome> {
    use super::{apply_outcome, FIELD_MANAGER};
    use crate::kubernetes::error::K8sError;
    use kube::api::{Patch, PatchParams};

    let name = pvc
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| K8sError::Internal("PersistentVolumeClaim has no name".to_string()))?;

    let pvcs = claims_api(client, namespace);
    let existing = pvcs.get_opt(name).await?;

    let params = PatchParams::apply(FIELD_MANAGER).force();
    let applied = pvcs.patch(name, &params, &Patch::Apply(pvc)).await?;

    Ok(apply_outcome(
        existing.as_ref().map(|p| &p.metadata),
        &applied.metadata,
    ))
}

/// Get a specific PVC; `None` if it does not exist
#[cfg(feature = "kubernetes")]
pub async fn get_pvc(
    client: &K8sClient,
    namespace: Option<&str>,
    name: &str,
) -> K8sResult<Option<PvcInfo>> {
    let pvcs = claims_api(client, namespace);
    let pvc = pvcs.get_opt(name).await?;

    Ok(pvc.map(pvc_to_info))
}

/// Delete a PVC
#[cfg(feature = "kubernetes")]
pub async fn delete_pvc(
    client: &K8sClient,
    namespace: Option<&str>,
    name: &str,
) -> K8sResult<DeleteOutcome> {
    use kube::api::DeleteParams;

    let pvcs = claims_api(client, namespace);
    match pvcs.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(DeleteOutcome::Deleted),
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(DeleteOutcome::NotFound),
        Err(e) => Err(e.into()),
    }
}

pub fn pvc_to_info(pvc: PersistentVolumeClaim) -> PvcInfo {
    let metadata = pvc.metadata;
    let spec = pvc.spec.unwrap_or_default();
    let status = pvc.status.unwrap_or_default();

    // Get capacity from status or spec
    let capacity = status
        .capacity
        .and_then(|c| c.get("storage").map(|q| q.0.clone()));

    let requested_capacity = spec
        .resources
        .and_then(|r| r.requests)
        .and_then(|r| r.get("storage").map(|q| q.0.clone()));

    PvcInfo {
        name: metadata.name.unwrap_or_default(),
        status: status.phase.unwrap_or_else(|| "Unknown".to_string()),
        volume_name: spec.volume_name,
        storage_class: spec.storage_class_name,
        capacity,
        requested_capacity,
    }
}

// ============================================================================
// Stubs for when kubernetes feature is disabled
// ============================================================================

#[cfg(not(feature = "kubernetes"))]
pub async fn apply_pvc(
    _client: &K8sClient,
    _namespace: Option<&str>,
    _pvc: &PersistentVolumeClaim,
) -> K8sResult<ApplyOutcome> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(not(feature = "kubernetes"))]
pub async fn get_pvc(
    _client: &K8sClient,
    _namespace: Option<&str>,
    _name: &str,
) -> K8sResult<Option<PvcInfo>> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(not(feature = "kubernetes"))]
pub async fn delete_pvc(
    _client: &K8sClient,
    _namespace: Option<&str>,
    _name: &str,
) -> K8sResult<DeleteOutcome> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::types::ResourceStatus;

    #[test]
    fn test_pvc_to_info_from_kubectl_json() {
        let json = serde_json::json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": {
                "name": "validator-4",
                "namespace": "default",
                "labels": { "libra-node": "true" },
                "creationTimestamp": "2024-01-01T00:00:00Z"
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "storageClassName": "teststorageclass",
                "resources": { "requests": { "storage": "50Gi" } }
            },
            "status": { "phase": "Pending" }
        });
        let pvc: PersistentVolumeClaim = serde_json::from_value(json).unwrap();
        let info = pvc_to_info(pvc);

        assert_eq!(info.name, "validator-4");
        assert_eq!(info.status, "Pending");
        assert_eq!(info.storage_class.as_deref(), Some("teststorageclass"));
        assert_eq!(info.requested_capacity.as_deref(), Some("50Gi"));
        assert!(info.capacity.is_none());
        assert!(info.volume_name.is_none());
    }

    #[test]
    fn test_pvc_to_info_bound() {
        let json = serde_json::json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": { "name": "fullnode-0-0" },
            "spec": {
                "volumeName": "pvc-1234",
                "resources": { "requests": { "storage": "50Gi" } }
            },
            "status": {
                "phase": "Bound",
                "accessModes": ["ReadWriteOnce"],
                "capacity": { "storage": "50Gi" }
            }
        });
        let pvc: PersistentVolumeClaim = serde_json::from_value(json).unwrap();
        let info = pvc_to_info(pvc);

        assert_eq!(info.status, "Bound");
        assert_eq!(info.volume_name.as_deref(), Some("pvc-1234"));
        assert_eq!(info.capacity.as_deref(), Some("50Gi"));

        let status = ResourceStatus::from(info);
        assert!(status.present);
        assert_eq!(status.phase.as_deref(), Some("Bound"));
        assert_eq!(status.volume.as_deref(), Some("pvc-1234"));
        assert!(status.provisioner.is_none());
    }
}
