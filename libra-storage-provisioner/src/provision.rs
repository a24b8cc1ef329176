//! Provisioning runner
//!
//! Submits a plan's manifests one at a time, in order: the StorageClass, the
//! validator claims, then the fullnode claims. Each submission completes
//! before the next starts. Teardown walks the same list backwards so that
//! claims go before the class they reference.

use crate::kubernetes::error::K8sResult;
use crate::kubernetes::manifests::Manifest;
use crate::kubernetes::types::{ApplyOutcome, DeleteOutcome, ResourceStatus};
use crate::kubernetes::ClusterBackend;
use libra_storage_common::{Phase, ResourceKind};
use serde::Serialize;

/// What to do when a submission fails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop at the first failure
    FailFast,
    /// Submit everything and collect failures
    KeepGoing,
}

/// Result of applying one manifest
#[derive(Debug, Clone, Serialize)]
pub struct ApplyRecord {
    pub kind: ResourceKind,
    pub name: String,
    pub phase: Phase,
    pub outcome: Option<ApplyOutcome>,
    pub error: Option<String>,
}

impl ApplyRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of deleting one resource
#[derive(Debug, Clone, Serialize)]
pub struct DeleteRecord {
    pub kind: ResourceKind,
    pub name: String,
    pub outcome: Option<DeleteOutcome>,
    pub error: Option<String>,
}

impl DeleteRecord {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Summary of an apply run
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionReport {
    pub backend: String,
    pub planned: usize,
    pub records: Vec<ApplyRecord>,
}

impl ProvisionReport {
    pub fn failures(&self) -> impl Iterator<Item = &ApplyRecord> {
        self.records.iter().filter(|r| !r.succeeded())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Manifests never submitted because an earlier one failed
    pub fn skipped(&self) -> usize {
        self.planned.saturating_sub(self.records.len())
    }

    pub fn count(&self, outcome: ApplyOutcome) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Some(outcome))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0 && self.skipped() == 0
    }
}

/// Summary of a teardown run
#[derive(Debug, Clone, Serialize)]
pub struct TeardownReport {
    pub backend: String,
    pub planned: usize,
    pub records: Vec<DeleteRecord>,
}

impl TeardownReport {
    pub fn failure_count(&self) -> usize {
        self.records.iter().filter(|r| !r.succeeded()).count()
    }

    pub fn deleted(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.outcome == Some(DeleteOutcome::Deleted))
            .count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0 && self.records.len() == self.planned
    }
}

/// Runs plans against a cluster backend
pub struct Provisioner<'a> {
    backend: &'a dyn ClusterBackend,
    policy: FailurePolicy,
}

impl<'a> Provisioner<'a> {
    pub fn new(backend: &'a dyn ClusterBackend, policy: FailurePolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn apply(&self, manifests: &[Manifest]) -> ProvisionReport {
        self.apply_with(manifests, |_| {}).await
    }

    /// Apply every manifest in order, reporting each result to `observer`
    pub async fn apply_with<F>(&self, manifests: &[Manifest], mut observer: F) -> ProvisionReport
    where
        F: FnMut(&ApplyRecord),
    {
        let mut report = ProvisionReport {
            backend: self.backend.name().to_string(),
            planned: manifests.len(),
            records: Vec::with_capacity(manifests.len()),
        };
        let mut current_phase = None;

        for manifest in manifests {
            let phase = manifest.phase();
            if current_phase != Some(phase) {
                tracing::info!(phase = %phase, backend = self.backend.name(), "Starting phase");
                current_phase = Some(phase);
            }

            let record = match self.backend.apply(manifest).await {
                Ok(outcome) => {
                    tracing::debug!(
                        kind = %manifest.kind(),
                        name = manifest.name(),
                        outcome = %outcome,
                        "Applied"
                    );
                    ApplyRecord {
                        kind: manifest.kind(),
                        name: manifest.name().to_string(),
                        phase,
                        outcome: Some(outcome),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(
                        kind = %manifest.kind(),
                        name = manifest.name(),
                        error = %e,
                        "Apply failed"
                    );
                    ApplyRecord {
                        kind: manifest.kind(),
                        name: manifest.name().to_string(),
                        phase,
                        outcome: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            observer(&record);
            let failed = !record.succeeded();
            report.records.push(record);

            if failed && self.policy == FailurePolicy::FailFast {
                tracing::warn!(
                    skipped = report.skipped(),
                    "Stopping after first failure"
                );
                break;
            }
        }

        report
    }

    /// Observed state of every planned resource
    pub async fn status(&self, manifests: &[Manifest]) -> K8sResult<Vec<ResourceStatus>> {
        let mut statuses = Vec::with_capacity(manifests.len());
        for manifest in manifests {
            statuses.push(self.backend.status(manifest.kind(), manifest.name()).await?);
        }
        Ok(statuses)
    }

    pub async fn teardown(&self, manifests: &[Manifest]) -> TeardownReport {
        self.teardown_with(manifests, |_| {}).await
    }

    /// Delete every planned resource, claims first and the StorageClass last
    pub async fn teardown_with<F>(&self, manifests: &[Manifest], mut observer: F) -> TeardownReport
    where
        F: FnMut(&DeleteRecord),
    {
        let mut report = TeardownReport {
            backend: self.backend.name().to_string(),
            planned: manifests.len(),
            records: Vec::with_capacity(manifests.len()),
        };

        for manifest in manifests.iter().rev() {
            let kind = manifest.kind();
            let name = manifest.name();

            let record = match self.backend.delete(kind, name).await {
                Ok(outcome) => {
                    tracing::debug!(kind = %kind, name, outcome = %outcome, "Deleted");
                    DeleteRecord {
                        kind,
                        name: name.to_string(),
                        outcome: Some(outcome),
                        error: None,
                    }
                }
                Err(e) => {
                    tracing::error!(kind = %kind, name, error = %e, "Delete failed");
                    DeleteRecord {
                        kind,
                        name: name.to_string(),
                        outcome: None,
                        error: Some(e.to_string()),
                    }
                }
            };

            observer(&record);
            let failed = !record.succeeded();
            report.records.push(record);

            if failed && self.policy == FailurePolicy::FailFast {
                break;
            }
        }

        report
    }
}
