//! Leakwatch CLI
//!
//! Extracts indicators from leaked text, matches them against a watchlist and
//! scores each leak.

mod render;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use leakwatch_core::{Document, LeakReport, LeakwatchConfig};
use leakwatch_harvest::{
    FileHarvester, HarvestConfig, Harvester, HttpHarvester, MockHarvester, StaticHarvester,
};
use leakwatch_runtime::{Pipeline, PipelineConfig};
use leakwatch_store::{StoreError, Watchlist};

use crate::render::render_report;

#[derive(Parser)]
#[command(name = "leakwatch")]
#[command(author, version, about = "Leakwatch: IOC extraction and risk scoring for leaked text", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1", global = true)]
    verbose: u8,

    /// Analysis configuration file (TOML)
    #[arg(long, env = "LEAKWATCH_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Watchlist file (JSON array of domains)
    #[arg(
        long,
        env = "LEAKWATCH_WATCHLIST",
        default_value = "leakwatch-watchlist.json",
        global = true
    )]
    watchlist: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan files, directories, or stdin
    Scan {
        /// Files or directories to scan
        paths: Vec<PathBuf>,

        /// Read a single document from stdin
        #[arg(long)]
        stdin: bool,

        /// Source label for every document (default: file name)
        #[arg(short, long)]
        source: Option<String>,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Fetch raw paste URLs and scan them
    Fetch {
        /// URLs to fetch
        #[arg(required = true)]
        urls: Vec<String>,

        /// Source label for every document (default: URL host)
        #[arg(short, long)]
        source: Option<String>,

        /// Request timeout in seconds
        #[arg(long, default_value = "30")]
        timeout: u64,

        /// Retries per URL
        #[arg(long, default_value = "3")]
        retries: u32,

        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the pipeline on the built-in sample leak
    Demo {
        /// Print reports as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage the domain watchlist
    Watchlist {
        #[command(subcommand)]
        action: WatchlistAction,
    },

    /// Print the effective analysis configuration
    Config,
}

#[derive(Subcommand)]
enum WatchlistAction {
    /// Add a domain (no-op if already present)
    Add { item: String },
    /// Remove a domain
    Remove { item: String },
    /// List watched domains
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let analysis = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan {
            paths,
            stdin,
            source,
            json,
        } => {
            let harvester: Box<dyn Harvester> = if stdin {
                let mut content = String::new();
                std::io::stdin()
                    .read_to_string(&mut content)
                    .context("stdin is not valid UTF-8 text")?;
                let label = source.as_deref().unwrap_or("stdin");
                Box::new(StaticHarvester::new(vec![Document::new(
                    label,
                    &content,
                    Utc::now(),
                )]))
            } else {
                if paths.is_empty() {
                    anyhow::bail!("Nothing to scan. Pass one or more paths or use --stdin");
                }
                let mut harvester = FileHarvester::new(paths);
                if let Some(source) = &source {
                    harvester = harvester.with_source(source);
                }
                Box::new(harvester)
            };
            run_pipeline(analysis, &cli.watchlist, harvester.as_ref(), json).await?;
        }
        Commands::Fetch {
            urls,
            source,
            timeout,
            retries,
            json,
        } => {
            let config = HarvestConfig::default()
                .with_timeout(timeout)
                .with_retries(retries);
            let mut harvester = HttpHarvester::new(urls, config)?;
            if let Some(source) = &source {
                harvester = harvester.with_source(source);
            }
            run_pipeline(analysis, &cli.watchlist, &harvester, json).await?;
        }
        Commands::Demo { json } => {
            run_pipeline(analysis, &cli.watchlist, &MockHarvester::new(), json).await?;
        }
        Commands::Watchlist { action } => {
            manage_watchlist(&cli.watchlist, action)?;
        }
        Commands::Config => {
            print!("{}", analysis.to_toml_string()?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<LeakwatchConfig> {
    match path {
        Some(path) => LeakwatchConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(LeakwatchConfig::default()),
    }
}

async fn run_pipeline(
    analysis: LeakwatchConfig,
    watchlist_path: &Path,
    harvester: &dyn Harvester,
    json: bool,
) -> Result<()> {
    let watchlist = Watchlist::load(watchlist_path)
        .with_context(|| format!("Failed to load watchlist from {}", watchlist_path.display()))?;

    let config = PipelineConfig::default()
        .with_analysis(analysis)
        .with_watchlist(Arc::new(watchlist));
    let mut pipeline = Pipeline::new(config)?;

    let reports = pipeline.run(harvester, Utc::now()).await?;
    print_reports(&reports, json)?;

    let stats = pipeline.stats();
    info!(
        "{} documents, {} indicators, {} watchlist hits, {} high risk",
        stats.documents, stats.indicators, stats.watchlist_hits, stats.high_risk
    );

    Ok(())
}

fn print_reports(reports: &[LeakReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
        return Ok(());
    }

    if reports.is_empty() {
        println!("No documents harvested.");
        return Ok(());
    }

    for report in reports {
        println!("{}", render_report(report));
    }

    Ok(())
}

fn manage_watchlist(path: &Path, action: WatchlistAction) -> Result<()> {
    let watchlist = Watchlist::load(path)
        .with_context(|| format!("Failed to load watchlist from {}", path.display()))?;

    match action {
        WatchlistAction::Add { item } => {
            if watchlist.add(&item)? {
                watchlist.save(path)?;
                println!("✅ Added {}", item.trim());
            } else {
                println!("Already watching {}", item.trim());
            }
        }
        WatchlistAction::Remove { item } => match watchlist.remove(&item) {
            Ok(()) => {
                watchlist.save(path)?;
                println!("✅ Removed {}", item.trim());
            }
            Err(StoreError::NotFound(item)) => {
                anyhow::bail!("{} is not in the watchlist", item);
            }
            Err(e) => return Err(e.into()),
        },
        WatchlistAction::List => {
            let items = watchlist.list();
            if items.is_empty() {
                println!("Watchlist is empty.");
            }
            for item in items {
                println!("{}", item);
            }
        }
    }

    Ok(())
}
