//! Provisioning command

use super::{build_backend, failure_policy};
use crate::output::{self, OutputFormat};
use crate::Backend;
use anyhow::{bail, Result};
use indicatif::{ProgressBar, ProgressStyle};
use libra_storage_provisioner::kubernetes::manifests::plan_manifests;
use libra_storage_provisioner::kubernetes::types::ApplyOutcome;
use libra_storage_provisioner::provision::ApplyRecord;
use libra_storage_provisioner::{ProvisionConfig, Provisioner};
use tabled::Tabled;

#[derive(Tabled)]
struct ApplyRow {
    kind: String,
    name: String,
    phase: String,
    result: String,
}

impl From<&ApplyRecord> for ApplyRow {
    fn from(record: &ApplyRecord) -> Self {
        let result = match (&record.outcome, &record.error) {
            (Some(outcome), _) => outcome.to_string(),
            (None, Some(error)) => format!("failed: {}", error),
            (None, None) => "-".to_string(),
        };

        Self {
            kind: record.kind.to_string(),
            name: record.name.clone(),
            phase: record.phase.to_string(),
            result,
        }
    }
}

pub async fn handle_apply_command(
    config: &ProvisionConfig,
    backend: Backend,
    keep_going: bool,
    dry_run: bool,
    format: OutputFormat,
) -> Result<()> {
    if dry_run {
        tracing::info!("Dry run, printing manifests without submitting");
        return super::render::handle_render_command(config, format);
    }

    let manifests = plan_manifests(config);

    let backend = build_backend(config, backend).await?;
    let provisioner = Provisioner::new(backend.as_ref(), failure_policy(keep_going));

    let pb = ProgressBar::new(manifests.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:20} [{bar:40.cyan/blue}] {pos}/{len}")?
            .progress_chars("=> "),
    );

    let report = provisioner
        .apply_with(&manifests, |record| {
            pb.set_message(record.name.clone());
            pb.inc(1);
        })
        .await;
    pb.finish_and_clear();

    let rows: Vec<ApplyRow> = report.records.iter().map(ApplyRow::from).collect();
    output::print_report(rows, &report, format)?;

    if !report.is_success() {
        bail!(
            "{} of {} manifests failed, {} not submitted",
            report.failure_count(),
            report.planned,
            report.skipped()
        );
    }

    if format == OutputFormat::Table {
        output::print_success(&format!(
            "Applied {} manifests via {} ({} created, {} configured, {} unchanged)",
            report.planned,
            report.backend,
            report.count(ApplyOutcome::Created),
            report.count(ApplyOutcome::Configured),
            report.count(ApplyOutcome::Unchanged),
        ));
    }

    Ok(())
}
