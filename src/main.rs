use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use hoverscan::backend::{AnalysisBackend, BackendStatus, HttpBackend};
use hoverscan::cache::AnalysisOutcome;
use hoverscan::config::Config;
use hoverscan::session::HoverSession;

/// Hoverscan - hover analysis client for the image risk backend
#[derive(Parser, Debug)]
#[command(name = "hoverscan")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyse one image URL and print the normalized result as JSON
    Analyze {
        /// Image URL or data URI
        url: String,

        /// Request the consent (LLM-enhanced) analysis mode
        #[arg(long)]
        consent: bool,
    },
    /// Probe the analysis backend and print online/offline
    Health,
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Ok(Config::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let config = load_config(args.config.as_ref())?;

    // Initialize logging subsystem
    hoverscan::logging::init_subscriber(config.logging.format)
        .context("Failed to initialize logging subsystem")?;

    tracing::info!(
        backend = %config.backend.base_url,
        analyze_path = %config.backend.analyze_path,
        cache_capacity = config.cache.capacity,
        "Configuration loaded successfully"
    );

    let backend = HttpBackend::new(config.backend.clone())?;

    match args.command {
        Command::Analyze { url, consent } => {
            let (session, _fired) = HoverSession::new(&config, Arc::new(backend));
            session.set_consent(consent);

            let resolution = session.analyze(&url).await;
            println!("{}", serde_json::to_string_pretty(&resolution.outcome)?);

            tracing::debug!(metrics = %hoverscan::metrics::export_text(), "Run metrics");

            if let AnalysisOutcome::Failure { message, .. } = &resolution.outcome {
                anyhow::bail!("Analysis failed: {}", message);
            }
        }
        Command::Health => {
            let status = backend.health().await;
            println!("{}", status);
            if status == BackendStatus::Offline {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
