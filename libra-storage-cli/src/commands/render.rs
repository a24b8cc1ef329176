//! Manifest rendering

use crate::output::{self, OutputFormat};
use anyhow::Result;
use libra_storage_provisioner::kubernetes::manifests::{plan_manifests, render_stream};
use libra_storage_provisioner::kubernetes::error::K8sResult;
use libra_storage_provisioner::ProvisionConfig;

/// Print the full plan, ready for `kubectl apply -f-`.
///
/// YAML is a multi-document stream; JSON is an array of objects.
pub fn handle_render_command(config: &ProvisionConfig, format: OutputFormat) -> Result<()> {
    let manifests = plan_manifests(config);

    if format == OutputFormat::Json {
        let objects = manifests
            .iter()
            .map(|m| m.to_json())
            .collect::<K8sResult<Vec<_>>>()?;
        output::print_json(&objects)?;
    } else {
        print!("{}", render_stream(&manifests)?);
    }

    tracing::debug!(manifests = manifests.len(), "Rendered plan");
    Ok(())
}
