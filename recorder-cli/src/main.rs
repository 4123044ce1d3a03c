//! Recorder TLS CLI

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use recorder_tls::{client_context, server_context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "recorder-tls")]
#[command(about = "TLS contexts for the recording proxy", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision both TLS contexts and report the server identity
    ///
    /// Reads RECORDER_TLS_KEYSTORE and RECORDER_TLS_KEYSTORE_PASSWORD.
    Check {
        /// Log level (trace, debug, info, warn, error)
        #[arg(short, long, default_value = "info")]
        log_level: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { log_level } => {
            init_tracing(&log_level)?;

            let server = server_context()
                .map_err(|e| anyhow!("failed to provision server TLS context: {e}"))?;
            let client = client_context();

            let identity = server.key_manager().primary();
            tracing::info!(
                origin = %server.origin(),
                alias = %identity.alias(),
                chain_len = identity.chain().len(),
                identities = server.key_manager().identities().len(),
                "Server context ready"
            );
            tracing::info!(
                accepted_issuers = client.trust().accepted_issuers().len(),
                "Client context ready"
            );
            Ok(())
        }

        Commands::Version => {
            println!("Recorder TLS");
            println!("Version: {}", env!("CARGO_PKG_VERSION"));
            println!("Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
            Ok(())
        }
    }
}

fn init_tracing(level: &str) -> Result<()> {
    let filter = match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_level(true),
        )
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(filter.into())
                .add_directive("rustls=warn".parse()?),
        )
        .init();

    Ok(())
}
