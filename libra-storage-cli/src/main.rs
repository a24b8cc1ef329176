//! Libra storage CLI
//!
//! Provisions the StorageClass and node volume claims of a Libra test network

mod commands;
mod output;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use libra_storage_provisioner::ProvisionConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level; overrides the configuration file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, global = true, default_value = "table")]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

/// How to reach the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// Pipe manifests into `kubectl apply -f-`
    Kubectl,
    /// Server-side apply through the Kubernetes API
    Api,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the manifests as a multi-document YAML stream
    Render,
    /// Create or update the StorageClass and every node claim
    Apply {
        #[arg(short, long, value_enum, default_value_t = Backend::Kubectl)]
        backend: Backend,
        /// Submit every manifest even after a failure
        #[arg(long)]
        keep_going: bool,
        /// Print what would be submitted without contacting the cluster
        #[arg(long)]
        dry_run: bool,
    },
    /// Show which planned resources exist in the cluster
    Status {
        #[arg(short, long, value_enum, default_value_t = Backend::Kubectl)]
        backend: Backend,
    },
    /// Delete every node claim, then the StorageClass
    Teardown {
        #[arg(short, long, value_enum, default_value_t = Backend::Kubectl)]
        backend: Backend,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Keep deleting after a failure
        #[arg(long)]
        keep_going: bool,
    },
    /// Print the effective configuration as TOML
    Config {
        /// Print the built-in defaults instead
        #[arg(long)]
        sample: bool,
    },
    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(
            shell,
            &mut Cli::command(),
            "libra-storage",
            &mut std::io::stdout(),
        );
        return Ok(());
    }

    let mut config = ProvisionConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    // Held until exit so buffered file logs are flushed
    let _log_guard = config.logging.init()?;

    let format = output::OutputFormat::from_str(&cli.output);
    tracing::debug!(
        storage_class = %config.storage_class.name,
        claims_per_role = config.claims.count,
        "Configuration loaded"
    );

    match cli.command {
        Commands::Render => commands::render::handle_render_command(&config, format)?,
        Commands::Apply {
            backend,
            keep_going,
            dry_run,
        } => {
            commands::apply::handle_apply_command(&config, backend, keep_going, dry_run, format)
                .await?
        }
        Commands::Status { backend } => {
            commands::status::handle_status_command(&config, backend, format).await?
        }
        Commands::Teardown {
            backend,
            yes,
            keep_going,
        } => {
            commands::teardown::handle_teardown_command(&config, backend, yes, keep_going, format)
                .await?
        }
        Commands::Config { sample } => commands::config::handle_config_command(&config, sample)?,
        Commands::Completions { .. } => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_defaults() {
        let cli = Cli::try_parse_from(["libra-storage", "apply"]).unwrap();
        match cli.command {
            Commands::Apply {
                backend,
                keep_going,
                dry_run,
            } => {
                assert_eq!(backend, Backend::Kubectl);
                assert!(!keep_going);
                assert!(!dry_run);
            }
            _ => panic!("expected apply"),
        }
        assert_eq!(cli.output, "table");
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "libra-storage",
            "teardown",
            "--backend",
            "api",
            "--yes",
            "-o",
            "json",
            "--config",
            "/tmp/libra.toml",
        ])
        .unwrap();

        assert_eq!(cli.output, "json");
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/libra.toml")));
        assert!(matches!(
            cli.command,
            Commands::Teardown {
                backend: Backend::Api,
                yes: true,
                keep_going: false,
            }
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(Cli::try_parse_from(["libra-storage", "status", "--backend", "helm"]).is_err());
    }
}
