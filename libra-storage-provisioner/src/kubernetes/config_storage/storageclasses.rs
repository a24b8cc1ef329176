//! StorageClass operations
//!
//! Apply, get and delete for the cluster-scoped StorageClass the node claims
//! are provisioned from.

use crate::kubernetes::client::K8sClient;
#[cfg(not(feature = "kubernetes"))]
use crate::kubernetes::error::K8sError;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::types::{ApplyOutcome, DeleteOutcome, StorageClassInfo};
use k8s_openapi::api::storage::v1::StorageClass;

/// Create or update a StorageClass with server-side apply
#[cfg(feature = "kubernetes")]
pub async fn apply_storage_class(client: &K8sClient, sc: &StorageClass) -> K8sResult<ApplyOutcome> {
    use super::{apply_outcome, FIELD_MANAGER};
    use crate::kubernetes::error::K8sError;
    use kube::api::{Api, Patch, PatchParams};

    let name = sc
        .metadata
        .name
        .as_deref()
        .ok_or_else(|| K8sError::Internal("StorageClass has no name".to_string()))?;

    let scs: Api<StorageClass> = Api::all(client.inner().clone());
    let existing = scs.get_opt(name).await?;

    let params = PatchParams::apply(FIELD_MANAGER).force();
    let applied = scs.patch(name, &params, &Patch::Apply(sc)).await?;

    Ok(apply_outcome(
        existing.as_ref().map(|s| &s.metadata),
        &applied.metadata,
    ))
}

/// Get a specific StorageClass; `None` if it does not exist
#[cfg(feature = "kubernetes")]
pub async fn get_storage_class(
    client: &K8sClient,
    name: &str,
) -> K8sResult<Option<StorageClassInfo>> {
    use kube::api::Api;

    let scs: Api<StorageClass> = Api::all(client.inner().clone());
    let sc = scs.get_opt(name).await?;

    Ok(sc.map(storage_class_to_info))
}

/// Delete a StorageClass
#[cfg(feature = "kubernetes")]
pub async fn delete_storage_class(client: &K8sClient, name: &str) -> K8sResult<DeleteOutcome> {
    use kube::api::{Api, DeleteParams};

    let scs: Api<StorageClass> = Api::all(client.inner().clone());
    match scs.delete(name, &DeleteParams::default()).await {
        Ok(_) => Ok(DeleteOutcome::Deleted),
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(DeleteOutcome::NotFound),
        Err(e) => Err(e.into()),
    }
}

pub fn storage_class_to_info(sc: StorageClass) -> StorageClassInfo {
    StorageClassInfo {
        name: sc.metadata.name.unwrap_or_default(),
        provisioner: sc.provisioner,
    }
}

// Stubs for when kubernetes feature is disabled
#[cfg(not(feature = "kubernetes"))]
pub async fn apply_storage_class(
    _client: &K8sClient,
    _sc: &StorageClass,
) -> K8sResult<ApplyOutcome> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(not(feature = "kubernetes"))]
pub async fn get_storage_class(
    _client: &K8sClient,
    _name: &str,
) -> K8sResult<Option<StorageClassInfo>> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(not(feature = "kubernetes"))]
pub async fn delete_storage_class(_client: &K8sClient, _name: &str) -> K8sResult<DeleteOutcome> {
    Err(K8sError::Internal("Kubernetes feature not enabled".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kubernetes::types::ResourceStatus;
    use libra_storage_common::ResourceKind;

    #[test]
    fn test_storage_class_to_info() {
        let json = serde_json::json!({
            "apiVersion": "storage.k8s.io/v1",
            "kind": "StorageClass",
            "metadata": {
                "name": "teststorageclass",
                "annotations": { "storageclass.kubernetes.io/is-default-class": "false" }
            },
            "provisioner": "kubernetes.io/aws-ebs",
            "parameters": { "type": "io1", "iopsPerGB": "50" },
            "reclaimPolicy": "Delete",
            "volumeBindingMode": "WaitForFirstConsumer",
            "allowVolumeExpansion": true
        });
        let sc: StorageClass = serde_json::from_value(json).unwrap();
        let info = storage_class_to_info(sc);

        assert_eq!(info.name, "teststorageclass");
        assert_eq!(info.provisioner, "kubernetes.io/aws-ebs");

        let status = ResourceStatus::from(info);
        assert_eq!(status.kind, ResourceKind::StorageClass);
        assert_eq!(status.storage_class.as_deref(), Some("teststorageclass"));
        assert_eq!(status.provisioner.as_deref(), Some("kubernetes.io/aws-ebs"));
        assert!(status.phase.is_none());
    }
}
