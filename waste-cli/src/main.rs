//! wastewise: classify waste images from the command line
//!
//! Thin front end over `waste-classifier`:
//! - `labels` / `health` query the inference endpoint
//! - `classify` runs one submission and prints its events
//! - `stats` summarizes a JSON export of stored records

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use waste_catalog::CategoryCatalog;
use waste_classifier::ClientConfig;

#[derive(Parser)]
#[command(name = "wastewise")]
#[command(about = "Classify waste images against a remote inference endpoint")]
struct Cli {
    /// Inference endpoint base URL
    #[arg(long, env = "WASTEWISE_API_BASE_URL")]
    url: Option<String>,

    /// Client configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Additional catalog entries (YAML), overriding built-ins
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Per-call timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the labels the endpoint can produce
    Labels,

    /// Check endpoint health
    Health,

    /// Classify one image
    Classify {
        /// Path to the image file
        #[arg(short, long)]
        image: PathBuf,

        /// User ID; when set, the result is saved and user stats are printed
        #[arg(long, requires = "user_name")]
        user: Option<String>,

        /// Display name stored with the result
        #[arg(long)]
        user_name: Option<String>,
    },

    /// Summarize a JSON array of stored records
    Stats {
        /// Path to the records file
        #[arg(short, long)]
        records: PathBuf,
    },
}

/// Targets logged at `info` unless `RUST_LOG` says otherwise.
const LOG_DIRECTIVES: &[&str] = &["wastewise=info", "waste_classifier=info", "waste_catalog=info"];

fn log_filter(mut filter: EnvFilter) -> anyhow::Result<EnvFilter> {
    for directive in LOG_DIRECTIVES {
        filter = filter.add_directive(directive.parse()?);
    }
    Ok(filter)
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let content = std::fs::read_to_string(path)?;
            ClientConfig::from_yaml(&content)?
        }
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.url {
        config.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = Some(timeout_ms);
    }

    Ok(config)
}

fn load_catalog(cli: &Cli) -> anyhow::Result<CategoryCatalog> {
    let catalog = CategoryCatalog::builtin();
    match &cli.catalog {
        Some(path) => {
            let overlay = CategoryCatalog::from_yaml(&std::fs::read_to_string(path)?)?;
            debug!(entries = overlay.len(), "Loaded catalog overlay");
            Ok(catalog.merged(overlay))
        }
        None => Ok(catalog),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::from_default_env())?)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    info!(base_url = %config.base_url, "Using inference endpoint");

    match cli.command {
        Command::Labels => commands::labels(&config).await,
        Command::Health => commands::health(&config).await,
        Command::Classify {
            ref image,
            ref user,
            ref user_name,
        } => {
            let catalog = load_catalog(&cli)?;
            commands::classify(&config, catalog, image, user.clone(), user_name.clone()).await
        }
        Command::Stats { ref records } => commands::stats(records),
    }
}
