//! Removal of the provisioned resources

use super::{build_backend, failure_policy};
use crate::output::{self, OutputFormat};
use crate::Backend;
use anyhow::{bail, Result};
use dialoguer::Confirm;
use libra_storage_provisioner::kubernetes::manifests::plan_manifests;
use libra_storage_provisioner::provision::DeleteRecord;
use libra_storage_provisioner::{ProvisionConfig, Provisioner};
use tabled::Tabled;

#[derive(Tabled)]
struct DeleteRow {
    kind: String,
    name: String,
    result: String,
}

impl From<&DeleteRecord> for DeleteRow {
    fn from(record: &DeleteRecord) -> Self {
        let result = match (&record.outcome, &record.error) {
            (Some(outcome), _) => outcome.to_string(),
            (None, Some(error)) => format!("failed: {}", error),
            (None, None) => "-".to_string(),
        };

        Self {
            kind: record.kind.to_string(),
            name: record.name.clone(),
            result,
        }
    }
}

pub async fn handle_teardown_command(
    config: &ProvisionConfig,
    backend: Backend,
    yes: bool,
    keep_going: bool,
    format: OutputFormat,
) -> Result<()> {
    let manifests = plan_manifests(config);

    if !yes {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Delete {} volume claims and StorageClass '{}'? Volume data will be lost",
                manifests.len() - 1,
                config.storage_class.name
            ))
            .default(false)
            .interact()?;

        if !confirm {
            output::print_info("Teardown aborted");
            return Ok(());
        }
    }

    let backend = build_backend(config, backend).await?;
    let report = Provisioner::new(backend.as_ref(), failure_policy(keep_going))
        .teardown(&manifests)
        .await;

    let rows: Vec<DeleteRow> = report.records.iter().map(DeleteRow::from).collect();
    output::print_report(rows, &report, format)?;

    if !report.is_success() {
        bail!(
            "Teardown incomplete: {} failed, {} not attempted",
            report.failure_count(),
            report.planned - report.records.len()
        );
    }

    if format == OutputFormat::Table {
        output::print_success(&format!(
            "Deleted {} resources ({} already absent)",
            report.deleted(),
            report.records.len() - report.deleted()
        ));
    }

    Ok(())
}
