//! Tidepool main entry point
//!
//! Command-line interface: `crawl <SEED_URL> <MAX_DEPTH>`.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tidepool::config::{load_config_with_hash, validate, Config};
use tidepool::output::{announce_start, print_statistics};
use tidepool::CrawlRun;
use tracing_subscriber::EnvFilter;

/// Tidepool: a bounded, budgeted web crawler
///
/// Fetches the seed page, then follows a random sample of its links up to
/// MAX_DEPTH levels deep, within fixed concurrency and volume budgets. Each
/// fetched URL is written to the output file in completion order, and the
/// file is printed when the crawl ends. Press Ctrl-C to stop early.
#[derive(Parser, Debug)]
#[command(name = "crawl")]
#[command(version)]
#[command(about = "A bounded, budgeted web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed_url: String,

    /// How many links deep to follow from the seed (0 fetches only the seed)
    #[arg(value_name = "MAX_DEPTH")]
    max_depth: u32,

    /// Path to a TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Where to write fetched URLs (overrides the config file)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Resolve relative links against the page they appear on
    #[arg(long)]
    follow_relative_links: bool,

    /// Print run statistics after the fetched URLs
    #[arg(long)]
    stats: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = build_config(&cli)?;

    announce_start(&mut std::io::stderr(), &cli.seed_url)?;
    let run = CrawlRun::new(config);
    let stats = run
        .execute(&cli.seed_url)
        .await
        .with_context(|| format!("crawl from {} failed", cli.seed_url))?;

    // The run's own handler is gone; from here Ctrl-C ends the process
    exit_on_interrupt();

    run.display(&mut std::io::stdout().lock())
        .context("failed to display crawl output")?;

    if cli.stats {
        println!();
        print_statistics(&stats);
    }

    Ok(())
}

/// Exits with the conventional SIGINT status on the next Ctrl-C
fn exit_on_interrupt() {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for the crawl output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tidepool=info,warn"),
            1 => EnvFilter::new("tidepool=debug,info"),
            2 => EnvFilter::new("tidepool=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn build_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    config.crawler.max_depth = cli.max_depth;
    if cli.follow_relative_links {
        config.crawler.follow_relative_links = true;
    }
    if let Some(output) = &cli.output {
        config.output.sink_path = output.display().to_string();
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}
