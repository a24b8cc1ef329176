//! Cluster status of the planned resources

use super::build_backend;
use crate::output::{self, OutputFormat};
use crate::Backend;
use anyhow::Result;
use libra_storage_provisioner::kubernetes::manifests::plan_manifests;
use libra_storage_provisioner::kubernetes::types::ResourceStatus;
use libra_storage_provisioner::{FailurePolicy, ProvisionConfig, Provisioner};
use tabled::Tabled;

#[derive(Tabled)]
struct StatusRow {
    kind: String,
    name: String,
    present: String,
    phase: String,
    storage_class: String,
    capacity: String,
    volume: String,
    provisioner: String,
}

impl From<&ResourceStatus> for StatusRow {
    fn from(status: &ResourceStatus) -> Self {
        Self {
            kind: status.kind.to_string(),
            name: status.name.clone(),
            present: if status.present { "yes" } else { "no" }.to_string(),
            phase: output::or_dash(status.phase.as_deref()),
            storage_class: output::or_dash(status.storage_class.as_deref()),
            capacity: output::or_dash(status.capacity.as_deref()),
            volume: output::or_dash(status.volume.as_deref()),
            provisioner: output::or_dash(status.provisioner.as_deref()),
        }
    }
}

pub async fn handle_status_command(
    config: &ProvisionConfig,
    backend: Backend,
    format: OutputFormat,
) -> Result<()> {
    let manifests = plan_manifests(config);
    let backend = build_backend(config, backend).await?;
    let statuses = Provisioner::new(backend.as_ref(), FailurePolicy::FailFast)
        .status(&manifests)
        .await?;

    let rows: Vec<StatusRow> = statuses.iter().map(StatusRow::from).collect();
    output::print_report(rows, &statuses, format)?;

    if format == OutputFormat::Table {
        let present = statuses.iter().filter(|s| s.present).count();
        let bound = statuses
            .iter()
            .filter(|s| s.phase.as_deref() == Some("Bound"))
            .count();

        if present == statuses.len() {
            output::print_success(&format!(
                "All {} resources present ({} claims bound)",
                present, bound
            ));
        } else {
            output::print_warning(&format!(
                "{} of {} resources missing",
                statuses.len() - present,
                statuses.len()
            ));
        }
    }

    Ok(())
}
