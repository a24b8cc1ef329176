//! Kubernetes types for the Libra storage provisioner
//!
//! Simplified representations of the storage resources the provisioner
//! submits and reports on.

use libra_storage_common::ResourceKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Storage Types (PVC, StorageClass)
// ============================================================================

/// PersistentVolumeClaim information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvcInfo {
    pub name: String,
    pub status: String,
    /// Bound PersistentVolume
    pub volume_name: Option<String>,
    pub storage_class: Option<String>,
    pub capacity: Option<String>,
    pub requested_capacity: Option<String>,
}

/// PersistentVolumeClaim to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PvcRequest {
    pub name: String,
    pub namespace: Option<String>,
    pub storage_class: Option<String>,
    pub access_modes: Vec<String>,
    pub storage: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

/// StorageClass information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageClassInfo {
    pub name: String,
    pub provisioner: String,
}

/// StorageClass to render
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageClassRequest {
    pub name: String,
    pub provisioner: String,
    pub reclaim_policy: Option<String>,
    pub volume_binding_mode: Option<String>,
    #[serde(default)]
    pub allow_volume_expansion: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

// ============================================================================
// Submission results
// ============================================================================

/// What the cluster did with an applied manifest
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplyOutcome {
    Created,
    Configured,
    Unchanged,
    /// Apply succeeded but the backend did not say how
    Applied,
}

impl ApplyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Configured => "configured",
            ApplyOutcome::Unchanged => "unchanged",
            ApplyOutcome::Applied => "applied",
        }
    }
}

impl fmt::Display for ApplyOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

impl fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteOutcome::Deleted => f.write_str("deleted"),
            DeleteOutcome::NotFound => f.write_str("not found"),
        }
    }
}

/// Observed state of one planned resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    pub name: String,
    pub present: bool,
    /// Claim phase (`Pending`, `Bound`, ...); `None` for StorageClasses
    pub phase: Option<String>,
    pub storage_class: Option<String>,
    pub capacity: Option<String>,
    /// PersistentVolume a claim is bound to
    pub volume: Option<String>,
    /// Provisioner of a StorageClass
    pub provisioner: Option<String>,
}

impl ResourceStatus {
    pub fn missing(kind: ResourceKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            present: false,
            phase: None,
            storage_class: None,
            capacity: None,
            volume: None,
            provisioner: None,
        }
    }
}

impl From<PvcInfo> for ResourceStatus {
    fn from(info: PvcInfo) -> Self {
        Self {
            kind: ResourceKind::PersistentVolumeClaim,
            name: info.name,
            present: true,
            phase: Some(info.status),
            storage_class: info.storage_class,
            capacity: info.capacity.or(info.requested_capacity),
            volume: info.volume_name,
            provisioner: None,
        }
    }
}

impl From<StorageClassInfo> for ResourceStatus {
    fn from(info: StorageClassInfo) -> Self {
        Self {
            kind: ResourceKind::StorageClass,
            storage_class: Some(info.name.clone()),
            name: info.name,
            present: true,
            phase: None,
            capacity: None,
            volume: None,
            provisioner: Some(info.provisioner),
        }
    }
}
