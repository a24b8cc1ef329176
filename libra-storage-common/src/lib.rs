//! Common types shared between libra-storage-provisioner and libra-storage-cli

pub mod validation;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Label attached to every node volume claim
pub const LIBRA_NODE_LABEL: &str = "libra-node";

/// StorageClass the node claims are bound to
pub const DEFAULT_STORAGE_CLASS: &str = "teststorageclass";

/// Number of claims provisioned per node role
pub const DEFAULT_CLAIMS_PER_ROLE: u32 = 30;

/// Storage requested by each claim
pub const DEFAULT_CLAIM_STORAGE: &str = "50Gi";

/// Role of the Libra node a volume claim is provisioned for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Validator,
    Fullnode,
}

impl NodeRole {
    /// Roles in provisioning order
    pub const ALL: [NodeRole; 2] = [NodeRole::Validator, NodeRole::Fullnode];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Validator => "validator",
            NodeRole::Fullnode => "fullnode",
        }
    }

    /// Name of the claim backing node `index` of this role.
    ///
    /// Full nodes carry a trailing `-0` because each one is the first (and only)
    /// full node attached to the validator with the same index.
    pub fn claim_name(&self, index: u32) -> String {
        match self {
            NodeRole::Validator => format!("validator-{}", index),
            NodeRole::Fullnode => format!("fullnode-{}-0", index),
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kubernetes resource kinds the provisioner manages
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    StorageClass,
    PersistentVolumeClaim,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::StorageClass => "StorageClass",
            ResourceKind::PersistentVolumeClaim => "PersistentVolumeClaim",
        }
    }

    /// Resource name as accepted by `kubectl get/delete`
    pub fn kubectl_resource(&self) -> &'static str {
        match self {
            ResourceKind::StorageClass => "storageclass",
            ResourceKind::PersistentVolumeClaim => "persistentvolumeclaim",
        }
    }

    pub fn is_namespaced(&self) -> bool {
        matches!(self, ResourceKind::PersistentVolumeClaim)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Provisioning phase a resource belongs to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    StorageClass,
    Validator,
    Fullnode,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::StorageClass => "storageclass",
            Phase::Validator => "validator",
            Phase::Fullnode => "fullnode",
        }
    }

    /// Node role whose claims make up this phase
    pub fn role(&self) -> Option<NodeRole> {
        match self {
            Phase::StorageClass => None,
            Phase::Validator => Some(NodeRole::Validator),
            Phase::Fullnode => Some(NodeRole::Fullnode),
        }
    }
}

impl From<NodeRole> for Phase {
    fn from(role: NodeRole) -> Self {
        match role {
            NodeRole::Validator => Phase::Validator,
            NodeRole::Fullnode => Phase::Fullnode,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single resource in a provisioning plan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanEntry {
    pub kind: ResourceKind,
    pub name: String,
    pub phase: Phase,
    /// Loop index for claims, `None` for the StorageClass
    pub index: Option<u32>,
}

/// Ordered layout of everything the provisioner submits
///
/// The StorageClass comes first, then the validator claims and finally the
/// fullnode claims, each role in ascending index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionPlan {
    storage_class: String,
    claims_per_role: u32,
}

impl ProvisionPlan {
    pub fn new(storage_class: impl Into<String>, claims_per_role: u32) -> Self {
        Self {
            storage_class: storage_class.into(),
            claims_per_role,
        }
    }

    /// All entries in submission order
    pub fn entries(&self) -> Vec<PlanEntry> {
        let mut entries = Vec::with_capacity(self.len());
        entries.push(PlanEntry {
            kind: ResourceKind::StorageClass,
            name: self.storage_class.clone(),
            phase: Phase::StorageClass,
            index: None,
        });

        for role in NodeRole::ALL {
            for index in 0..self.claims_per_role {
                entries.push(PlanEntry {
                    kind: ResourceKind::PersistentVolumeClaim,
                    name: role.claim_name(index),
                    phase: role.into(),
                    index: Some(index),
                });
            }
        }

        entries
    }

    /// Total number of resources in the plan
    pub fn len(&self) -> usize {
        1 + NodeRole::ALL.len() * self.claims_per_role as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Default for ProvisionPlan {
    fn default() -> Self {
        Self::new(DEFAULT_STORAGE_CLASS, DEFAULT_CLAIMS_PER_ROLE)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_names() {
        assert_eq!(NodeRole::Validator.claim_name(0), "validator-0");
        assert_eq!(NodeRole::Validator.claim_name(29), "validator-29");
        assert_eq!(NodeRole::Fullnode.claim_name(0), "fullnode-0-0");
        assert_eq!(NodeRole::Fullnode.claim_name(29), "fullnode-29-0");
    }

    #[test]
    fn test_default_plan_layout() {
        let plan = ProvisionPlan::default();
        let entries = plan.entries();

        assert_eq!(entries.len(), 61);
        assert_eq!(plan.len(), 61);

        let classes: Vec<_> = entries
            .iter()
            .filter(|e| e.kind == ResourceKind::StorageClass)
            .collect();
        assert_eq!(classes.len(), 1);
        assert_eq!(classes[0].name, "teststorageclass");

        assert_eq!(entries[0].phase, Phase::StorageClass);
        assert_eq!(entries[1].name, "validator-0");
        assert_eq!(entries[30].name, "validator-29");
        assert_eq!(entries[31].name, "fullnode-0-0");
        assert_eq!(entries[60].name, "fullnode-29-0");
    }

    #[test]
    fn test_plan_indices_are_ascending_per_phase() {
        let plan = ProvisionPlan::new("fast", 5);
        for phase in [Phase::Validator, Phase::Fullnode] {
            let indices: Vec<u32> = plan
                .entries()
                .iter()
                .filter(|e| e.phase == phase)
                .filter_map(|e| e.index)
                .collect();
            assert_eq!(indices, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&Phase::Fullnode).unwrap();
        assert_eq!(json, "\"fullnode\"");
        let role: NodeRole = serde_json::from_str("\"validator\"").unwrap();
        assert_eq!(role, NodeRole::Validator);
    }
}
