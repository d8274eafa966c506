#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for replaying captured portal sessions.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use portal_scrape_extract::{ExtractConfig, ScrapePool, StaticSession};
use portal_scrape_extract_models::CollectedRecord;
use portal_scrape_report::{render, render_html};

/// Shown in place of a report when a scrape fails as a whole.
const SCRAPE_FAILED_MESSAGE: &str =
    "Не удалось получить данные: сайт недоступен или неверные учётные данные.";

#[derive(Parser)]
#[command(name = "portal_scrape", about = "Account portal field extraction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay captured session directories and print one report each
    Replay {
        /// Directories containing a `session.toml` manifest
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        /// TOML config file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Report format
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
        /// Maximum number of sessions replayed at once
        #[arg(long, default_value = "4")]
        concurrency: usize,
        /// Write page captures here, one `capture-NNNN` directory per
        /// replayed session
        #[arg(long)]
        dump_dir: Option<PathBuf>,
    },
    /// Print the effective configuration as TOML
    ShowConfig {
        /// TOML config file (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Html,
    Json,
}

fn format_report(record: &CollectedRecord, format: Format) -> Result<String, serde_json::Error> {
    Ok(match format {
        Format::Text => render(record),
        Format::Html => render_html(record),
        Format::Json => serde_json::to_string_pretty(record)?,
    })
}

fn load_config(path: Option<&Path>) -> Result<ExtractConfig, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => {
            log::info!("Loading config from {}", path.display());
            ExtractConfig::from_path(path)?
        }
        None => ExtractConfig::default(),
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            dirs,
            config,
            format,
            concurrency,
            dump_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = dump_dir {
                config = config.with_dump_dir(dir);
            }
            replay(&dirs, config, format, concurrency).await
        }
        Commands::ShowConfig { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", toml::to_string(&config)?);
            Ok(())
        }
    }
}

async fn replay(
    dirs: &[PathBuf],
    config: ExtractConfig,
    format: Format,
    concurrency: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut sessions = Vec::new();
    let mut loaded = Vec::new();
    let mut failures = 0_usize;

    for dir in dirs {
        match StaticSession::from_dir(dir) {
            Ok(session) => {
                sessions.push(session);
                loaded.push(dir);
            }
            Err(e) => {
                log::error!("Skipping {}: {e}", dir.display());
                failures += 1;
            }
        }
    }

    log::info!(
        "Replaying {} sessions (concurrency {concurrency})",
        sessions.len()
    );
    let pool = ScrapePool::new(Arc::new(config), concurrency);
    let results = pool.run_all(sessions).await;

    for (dir, result) in loaded.into_iter().zip(results) {
        if dirs.len() > 1 {
            println!("# {}", dir.display());
        }
        match result {
            Ok(record) => println!("{}", format_report(&record, format)?),
            Err(e) => {
                log::error!("Scrape of {} failed: {e}", dir.display());
                println!("{SCRAPE_FAILED_MESSAGE}");
                failures += 1;
            }
        }
        println!();
    }

    if failures > 0 {
        return Err(format!("{failures} of {} sessions failed", dirs.len()).into());
    }
    Ok(())
}
