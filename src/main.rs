//! ctxbroker - inspect contract fingerprints and host topology.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use ctxbroker::context::{
    fingerprint, interface, Category, ConnectionGraph, PluginId, StaticTopology,
};
use ctxbroker::BrokerConfig;

/// ctxbroker - plugin context broker tooling
#[derive(Parser, Debug)]
#[command(name = "ctxbroker")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to broker configuration file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log filter (overrides the config file; RUST_LOG wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the fingerprints of the built-in root contracts
    Fingerprints {
        /// Emit JSON instead of plain text
        #[arg(long)]
        json: bool,
    },

    /// Check whether one plugin may access another's contexts
    Connected {
        /// Requesting plugin
        #[arg(long)]
        from: u64,

        /// Owning plugin
        #[arg(long)]
        to: u64,
    },

    /// Validate the configuration file
    CheckConfig,
}

#[derive(Serialize)]
struct RootFingerprint {
    category: Category,
    interface: String,
    fingerprint: String,
    canonical: String,
}

fn load_config(path: Option<&PathBuf>) -> Result<BrokerConfig> {
    let path = path.cloned().unwrap_or_else(BrokerConfig::default_path);
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No config file, using defaults");
        return Ok(BrokerConfig::default());
    }
    BrokerConfig::load(&path).with_context(|| format!("Failed to load {}", path.display()))
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn root_fingerprints() -> Vec<RootFingerprint> {
    Category::ALL
        .into_iter()
        .map(|category| {
            let root = interface::root_contract(category);
            RootFingerprint {
                category,
                interface: root.name().to_string(),
                fingerprint: fingerprint::fingerprint(&root).to_string(),
                canonical: fingerprint::canonical_signature(root.methods()),
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;
    init_tracing(cli.log_level.as_deref().unwrap_or(&config.log_filter));

    match cli.command {
        Commands::Fingerprints { json } => {
            let roots = root_fingerprints();
            if json {
                println!("{}", serde_json::to_string_pretty(&roots)?);
            } else {
                for root in roots {
                    println!("{:<16} {}", root.interface, root.fingerprint);
                }
            }
        }
        Commands::Connected { from, to } => {
            let topology = StaticTopology::from_config(&config.topology);
            let connected = topology.is_connected(PluginId(from), PluginId(to));
            println!("{from} -> {to}: {}", if connected { "allowed" } else { "denied" });
        }
        Commands::CheckConfig => {
            let topology = StaticTopology::from_config(&config.topology);
            println!(
                "config ok: {} link(s), compiler lookups {}",
                topology.len(),
                if config.compiler_lookups_gated { "gated" } else { "open" }
            );
        }
    }
    Ok(())
}
