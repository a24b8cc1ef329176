//! Manifest construction and rendering
//!
//! Builds typed `k8s_openapi` objects for the StorageClass and the node
//! claims, and renders them as the YAML documents fed to `kubectl apply -f-`.

use crate::config::ProvisionConfig;
use crate::kubernetes::error::K8sResult;
use crate::kubernetes::types::{PvcRequest, StorageClassRequest};
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::api::storage::v1::StorageClass;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use libra_storage_common::{NodeRole, Phase, ResourceKind};
use std::collections::BTreeMap;

/// A rendered resource ready for submission
#[derive(Debug, Clone)]
pub enum Manifest {
    StorageClass(StorageClass),
    Claim {
        role: NodeRole,
        index: u32,
        pvc: PersistentVolumeClaim,
    },
}

impl Manifest {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Manifest::StorageClass(_) => ResourceKind::StorageClass,
            Manifest::Claim { .. } => ResourceKind::PersistentVolumeClaim,
        }
    }

    pub fn name(&self) -> &str {
        let metadata = match self {
            Manifest::StorageClass(sc) => &sc.metadata,
            Manifest::Claim { pvc, .. } => &pvc.metadata,
        };
        metadata.name.as_deref().unwrap_or_default()
    }

    /// Namespace set on the object, if any (StorageClasses are cluster-scoped)
    pub fn namespace(&self) -> Option<&str> {
        match self {
            Manifest::StorageClass(_) => None,
            Manifest::Claim { pvc, .. } => pvc.metadata.namespace.as_deref(),
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Manifest::StorageClass(_) => Phase::StorageClass,
            Manifest::Claim { role, .. } => (*role).into(),
        }
    }

    /// `kind/name` as kubectl prints it
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind().kubectl_resource(), self.name())
    }

    /// Render as a single YAML document
    pub fn to_yaml(&self) -> K8sResult<String> {
        let yaml = match self {
            Manifest::StorageClass(sc) => serde_yaml::to_string(sc)?,
            Manifest::Claim { pvc, .. } => serde_yaml::to_string(pvc)?,
        };
        Ok(yaml)
    }

    pub fn to_json(&self) -> K8sResult<serde_json::Value> {
        let value = match self {
            Manifest::StorageClass(sc) => serde_json::to_value(sc)?,
            Manifest::Claim { pvc, .. } => serde_json::to_value(pvc)?,
        };
        Ok(value)
    }
}

fn non_empty(map: &BTreeMap<String, String>) -> Option<BTreeMap<String, String>> {
    if map.is_empty() {
        None
    } else {
        Some(map.clone())
    }
}

/// Build a StorageClass object
pub fn build_storage_class(request: &StorageClassRequest) -> StorageClass {
    StorageClass {
        metadata: ObjectMeta {
            name: Some(request.name.clone()),
            labels: non_empty(&request.labels),
            ..Default::default()
        },
        provisioner: request.provisioner.clone(),
        reclaim_policy: request.reclaim_policy.clone(),
        volume_binding_mode: request.volume_binding_mode.clone(),
        allow_volume_expansion: Some(request.allow_volume_expansion),
        parameters: non_empty(&request.parameters),
        ..Default::default()
    }
}

/// Build a PersistentVolumeClaim object
pub fn build_pvc(request: &PvcRequest) -> PersistentVolumeClaim {
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), Quantity(request.storage.clone()));

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(request.name.clone()),
            namespace: request.namespace.clone(),
            labels: non_empty(&request.labels),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(request.access_modes.clone()),
            storage_class_name: request.storage_class.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                limits: None,
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Every manifest of the configured plan, in submission order
pub fn plan_manifests(config: &ProvisionConfig) -> Vec<Manifest> {
    let storage_class = config.storage_class.to_request();

    config
        .plan()
        .entries()
        .into_iter()
        .map(|entry| match (entry.phase.role(), entry.index) {
            (Some(role), Some(index)) => {
                let request = config.claims.request_for(role, index, &storage_class.name);
                Manifest::Claim {
                    role,
                    index,
                    pvc: build_pvc(&request),
                }
            }
            _ => Manifest::StorageClass(build_storage_class(&storage_class)),
        })
        .collect()
}

/// Render manifests as one multi-document YAML stream
pub fn render_stream(manifests: &[Manifest]) -> K8sResult<String> {
    let mut out = String::new();
    for manifest in manifests {
        out.push_str("---\n");
        out.push_str(&manifest.to_yaml()?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_class_yaml() {
        let config = ProvisionConfig::default();
        let sc = build_storage_class(&config.storage_class.to_request());
        let yaml = Manifest::StorageClass(sc).to_yaml().unwrap();
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(doc["apiVersion"], "storage.k8s.io/v1");
        assert_eq!(doc["kind"], "StorageClass");
        assert_eq!(doc["metadata"]["name"], "teststorageclass");
        assert_eq!(doc["provisioner"], "kubernetes.io/aws-ebs");
        assert_eq!(doc["parameters"]["type"], "io1");
        assert_eq!(doc["parameters"]["iopsPerGB"], "50");
        assert_eq!(doc["reclaimPolicy"], "Delete");
        assert_eq!(doc["volumeBindingMode"], "WaitForFirstConsumer");
        assert_eq!(doc["allowVolumeExpansion"], true);
    }

    #[test]
    fn test_pvc_yaml() {
        let config = ProvisionConfig::default();
        let request = config
            .claims
            .request_for(NodeRole::Validator, 3, "teststorageclass");
        let manifest = Manifest::Claim {
            role: NodeRole::Validator,
            index: 3,
            pvc: build_pvc(&request),
        };
        let doc: serde_yaml::Value = serde_yaml::from_str(&manifest.to_yaml().unwrap()).unwrap();

        assert_eq!(doc["apiVersion"], "v1");
        assert_eq!(doc["kind"], "PersistentVolumeClaim");
        assert_eq!(doc["metadata"]["name"], "validator-3");
        assert_eq!(doc["metadata"]["labels"]["libra-node"], "true");
        assert!(doc["metadata"].get("namespace").is_none());
        assert_eq!(doc["spec"]["storageClassName"], "teststorageclass");
        assert_eq!(doc["spec"]["accessModes"][0], "ReadWriteOnce");
        assert_eq!(doc["spec"]["resources"]["requests"]["storage"], "50Gi");
    }

    #[test]
    fn test_label_value_stays_a_string() {
        let config = ProvisionConfig::default();
        let manifests = plan_manifests(&config);
        let yaml = manifests[1].to_yaml().unwrap();

        // An unquoted `true` would be a YAML boolean and rejected as a label value
        assert!(!yaml.contains("libra-node: true"));
        let doc: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();
        assert!(doc["metadata"]["labels"]["libra-node"].is_string());
    }

    #[test]
    fn test_plan_manifests_order_and_names() {
        let config = ProvisionConfig::default();
        let manifests = plan_manifests(&config);

        assert_eq!(manifests.len(), 61);
        assert_eq!(manifests[0].kind(), ResourceKind::StorageClass);
        assert_eq!(manifests[0].name(), "teststorageclass");

        let validators: Vec<_> = manifests[1..31].iter().map(|m| m.name().to_string()).collect();
        let expected: Vec<_> = (0..30).map(|i| format!("validator-{}", i)).collect();
        assert_eq!(validators, expected);

        let fullnodes: Vec<_> = manifests[31..].iter().map(|m| m.name().to_string()).collect();
        let expected: Vec<_> = (0..30).map(|i| format!("fullnode-{}-0", i)).collect();
        assert_eq!(fullnodes, expected);

        assert!(manifests[1..]
            .iter()
            .all(|m| m.kind() == ResourceKind::PersistentVolumeClaim));
    }

    #[test]
    fn test_namespace_is_applied_to_claims_only() {
        let mut config = ProvisionConfig::default();
        config.claims.namespace = Some("libra".to_string());
        let manifests = plan_manifests(&config);

        assert_eq!(manifests[0].namespace(), None);
        assert!(manifests[1..].iter().all(|m| m.namespace() == Some("libra")));
    }

    #[test]
    fn test_render_stream() {
        let config = ProvisionConfig::default();
        let stream = render_stream(&plan_manifests(&config)).unwrap();

        let docs: Vec<serde_yaml::Value> = serde_yaml::Deserializer::from_str(&stream)
            .map(|d| serde::Deserialize::deserialize(d).unwrap())
            .collect();
        assert_eq!(docs.len(), 61);

        let class_count = docs.iter().filter(|d| d["kind"] == "StorageClass").count();
        assert_eq!(class_count, 1);

        for doc in docs.iter().filter(|d| d["kind"] == "PersistentVolumeClaim") {
            assert_eq!(doc["spec"]["storageClassName"], "teststorageclass");
            assert_eq!(doc["spec"]["resources"]["requests"]["storage"], "50Gi");
            assert_eq!(doc["metadata"]["labels"]["libra-node"], "true");
        }
    }
}
