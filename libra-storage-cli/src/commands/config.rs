use anyhow::Result;
use libra_storage_provisioner::ProvisionConfig;

pub fn handle_config_command(config: &ProvisionConfig, sample: bool) -> Result<()> {
    if sample {
        print!("{}", ProvisionConfig::generate_sample());
    } else {
        print!("{}", config.to_toml()?);
    }
    Ok(())
}
