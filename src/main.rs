//! spindle - Round-robin provider dispatch gateway for outbound API calls
//!
//! A small gateway that forwards chat-completion requests to registered
//! upstream providers, rotating between them and injecting per-provider
//! credentials.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use spindle::config::{Config, KeySource};
use spindle::gateway::run_server;

#[derive(Parser)]
#[command(name = "spindle")]
#[command(about = "Round-robin provider dispatch gateway for outbound API calls")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the gateway server
    Serve {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,

        /// Override listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Validate configuration file
    Check {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },

    /// Show configured providers and their credential sources
    Providers {
        /// Path to configuration file
        #[arg(short, long, default_value = "config.toml")]
        config: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spindle=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, listen } => {
            tracing::info!(config = %config, "Loading configuration");
            let (mut config, key_sources) = Config::from_file_with_env(&config)?;

            for (provider, source) in &key_sources {
                tracing::info!(provider = %provider, key_source = %source, "Resolved API key");
            }

            if let Some(addr) = listen {
                tracing::info!(listen = %addr, "Override listen address");
                config.server.listen = addr;
            }

            run_server(config).await
        }

        Commands::Check { config } => {
            tracing::info!(config = %config, "Checking configuration");
            let (config, key_sources) = Config::from_file_with_env(&config)?;

            let missing: Vec<&str> = config
                .providers
                .iter()
                .zip(key_sources.iter())
                .filter(|(p, (_, source))| p.requires_credential && *source == KeySource::None)
                .map(|(p, _)| p.name.as_str())
                .collect();

            if missing.is_empty() {
                println!(
                    "Configuration OK: {} provider(s), listening on {}",
                    config.providers.len(),
                    config.server.listen
                );
                Ok(())
            } else {
                anyhow::bail!(
                    "Providers requiring a credential have none configured: {}",
                    missing.join(", ")
                )
            }
        }

        Commands::Providers { config } => {
            let (config, key_sources) = Config::from_file_with_env(&config)?;

            if config.providers.is_empty() {
                println!("No providers configured");
                return Ok(());
            }

            for (provider, (_, source)) in config.providers.iter().zip(key_sources.iter()) {
                println!(
                    "{:<24} {:<48} requires_credential={:<5} key={}",
                    provider.name, provider.url, provider.requires_credential, source
                );
            }
            Ok(())
        }
    }
}
