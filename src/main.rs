//! Threadgrab main entry point
//!
//! This is the command-line interface that loads configuration and serves
//! the scraping API.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use threadgrab::config::{apply_env_overrides, load_config_with_hash, validate, Config};
use threadgrab::pipeline::{Orchestrator, ScrapeRequest};
use threadgrab::server;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Threadgrab: a scraping backend for discussion pages
///
/// Threadgrab fetches a discussion page, solves a reCAPTCHA through an
/// external service when one blocks the page, and returns the title heading
/// and leading comments as JSON.
#[derive(Parser, Debug)]
#[command(name = "threadgrab")]
#[command(version = "1.0.0")]
#[command(about = "A scraping backend for discussion pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address, e.g. 127.0.0.1:8080
    #[arg(long, value_name = "ADDR")]
    bind: Option<SocketAddr>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config, print a summary, and exit
    #[arg(long, conflicts_with = "once")]
    check_config: bool,

    /// Scrape a single URL, print the result as JSON, and exit
    #[arg(long, value_name = "URL")]
    once: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    // .env is optional; it only supplies CAPSOLVER_API_KEY in development
    let _ = dotenvy::dotenv();

    let mut config = load(&cli)?;
    apply_env_overrides(&mut config);
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind.to_string();
    }

    if cli.check_config {
        print_config_summary(&config);
        return Ok(());
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config)?);

    if let Some(url) = cli.once {
        return handle_once(&orchestrator, url).await;
    }

    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind_address))?;

    tracing::info!("Starting server on {}...", addr);
    server::serve(addr, orchestrator)
        .await
        .context("server terminated with an error")?;

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("threadgrab=info,tower_http=info,warn"),
            1 => EnvFilter::new("threadgrab=debug,tower_http=debug,info"),
            2 => EnvFilter::new("threadgrab=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the configuration file, or the defaults when none is given
fn load(cli: &Cli) -> anyhow::Result<Config> {
    match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            Ok(config)
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
    }
}

/// Handles --check-config: shows the effective configuration
fn print_config_summary(config: &Config) {
    println!("=== Threadgrab Configuration ===\n");

    println!("Server:");
    println!("  Bind address: {}", config.server.bind_address);

    println!("\nScraper:");
    println!("  User agent: {}", config.scraper.user_agent);
    println!("  Comments endpoint: {}", config.scraper.comments_endpoint);
    println!("  Request timeout: {}s", config.scraper.request_timeout);

    println!("\nSolver:");
    println!("  API base: {}", config.solver.api_base);
    println!(
        "  Client key: {}",
        if config.solver.client_key.is_some() {
            "configured"
        } else {
            "missing (challenged pages will fail)"
        }
    );
    println!("  Poll interval: {}ms", config.solver.poll_interval);
    println!(
        "  Backoff: {}ms .. {}ms",
        config.solver.initial_backoff, config.solver.max_backoff
    );
    println!("  Timeout: {}s", config.solver.timeout);

    println!("\nOutput:");
    if config.output.enabled {
        println!("  Result path: {}", config.output.result_path);
    } else {
        println!("  Disabled");
    }

    println!("\n✓ Configuration is valid");
}

/// Handles --once: runs a single scrape and prints the result
async fn handle_once(orchestrator: &Orchestrator, url: String) -> anyhow::Result<()> {
    let request = ScrapeRequest::new(url)?;
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    match orchestrator.scrape(&request, &cancel).await {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Scrape failed: {}", e);
            Err(e.into())
        }
    }
}
