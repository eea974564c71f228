//! avgcalc: sliding-window average over upstream number sequences.
//!
//! Run with:  `RUST_LOG=info avgcalc fetch primes --cycles 3`
//!
//! State is printed to stdout as one JSON object per line; logs go to stderr.

use anyhow::{Context, Result};
use avgcalc_config::{default_path, load as load_config, AvgConfig, ConfigWatcher};
use avgcalc_core::{Category, WindowSize};
use avgcalc_fetch::Fetcher;
use avgcalc_session::{spawn_poller, Session, Snapshot};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "avgcalc", version, about = "Sliding-window average over upstream number sequences")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/avgcalc/avgcalc.toml).
    #[arg(long, env = "AVGCALC_CONFIG")]
    config: Option<PathBuf>,

    /// Override `upstream.base_url`.
    #[arg(long, env = "AVGCALC_BASE_URL")]
    base_url: Option<String>,

    /// Override `upstream.timeout_ms`.
    #[arg(long, env = "AVGCALC_TIMEOUT_MS")]
    timeout_ms: Option<u64>,

    /// Override `window.size`. Must be positive.
    #[arg(long, env = "AVGCALC_WINDOW_SIZE", allow_negative_numbers = true)]
    window_size: Option<i64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a fixed number of fetch-and-fold cycles and print each state.
    Fetch {
        /// p | f | e | r (or primes, fibonacci, evens, random).
        category: String,
        #[arg(long, default_value_t = 1)]
        cycles: u32,
    },
    /// Keep polling, reloading the config file when it changes.
    Watch {
        category: String,
    },
    /// List categories and the fallback batch each one serves.
    Categories,
}

impl Cli {
    fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_path)
    }

    /// Load the config file and apply command-line overrides on top.
    fn resolve_config(&self, path: &Path) -> Result<AvgConfig> {
        let mut config = load_config(path)?;
        if let Some(url) = &self.base_url {
            config.upstream.base_url = url.clone();
        }
        if let Some(ms) = self.timeout_ms {
            config.upstream.timeout_ms = ms;
        }
        if let Some(size) = self.window_size {
            config.window.size = size;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging; RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config_path();
    let config = cli.resolve_config(&config_path)?;

    match &cli.command {
        Command::Fetch { category, cycles } => {
            let (category, window_size) = validate(category, &config)?;
            run_fetch(&config, category, window_size, *cycles).await
        }
        Command::Watch { category } => {
            let (category, window_size) = validate(category, &config)?;
            run_watch(&cli, &config_path, config, category, window_size).await
        }
        Command::Categories => {
            let table = config.fallback_table();
            for category in Category::ALL {
                println!(
                    "{}  {:<9}  fallback {:?}",
                    category.id(),
                    category.label(),
                    table.get(category)
                );
            }
            Ok(())
        }
    }
}

/// Reject bad categories and window sizes before any request goes out.
fn validate(category: &str, config: &AvgConfig) -> Result<(Category, WindowSize)> {
    let category = category.parse::<Category>()?;
    let window_size = config.window_size()?;
    Ok((category, window_size))
}

fn build_fetcher(config: &AvgConfig) -> Result<Fetcher> {
    let client = reqwest::Client::builder()
        .build()
        .context("building HTTP client")?;
    Ok(Fetcher::new(client, config.upstream.base_url.clone(), config.timeout())
        .with_fallback(config.fallback_table()))
}

fn print_snapshot(snapshot: &Snapshot) -> Result<()> {
    println!("{}", serde_json::to_string(snapshot)?);
    Ok(())
}

async fn run_fetch(
    config: &AvgConfig,
    category: Category,
    window_size: WindowSize,
    cycles: u32,
) -> Result<()> {
    let mut session = Session::new(build_fetcher(config)?, category, window_size);

    for _ in 0..cycles {
        session.refresh().await;
        if let Some(snapshot) = session.snapshot() {
            print_snapshot(&snapshot)?;
        }
    }
    Ok(())
}

async fn run_watch(
    cli: &Cli,
    config_path: &Path,
    config: AvgConfig,
    category: Category,
    window_size: WindowSize,
) -> Result<()> {
    info!(
        %category,
        %window_size,
        interval_ms = config.poll.interval_ms,
        "watching {}",
        config.upstream.base_url
    );

    let session = Session::new(build_fetcher(&config)?, category, window_size);
    let (poller, mut updates) = spawn_poller(session, config.poll_interval());
    let (_watcher, mut reloads) = ConfigWatcher::spawn(config_path);

    let mut current = config;
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(snapshot) => print_snapshot(&snapshot)?,
                None => {
                    warn!("Poller stopped; exiting");
                    break;
                }
            },
            Some(()) = reloads.recv() => {
                let next = match cli.resolve_config(config_path) {
                    Ok(cfg) => cfg,
                    Err(e) => {
                        warn!("Config reload failed: {e}");
                        continue;
                    }
                };
                info!("Config reloaded");

                match (next.window_size(), current.window_size()) {
                    (Ok(new), Ok(old)) if new != old => {
                        poller.resize(new).await;
                    }
                    (Err(e), _) => {
                        warn!("Ignoring reloaded config: {e}");
                        continue;
                    }
                    _ => {}
                }
                if next.upstream != current.upstream || next.fallback != current.fallback {
                    warn!("Upstream and fallback changes apply on restart");
                }
                current = next;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted; shutting down");
                poller.shutdown().await;
                break;
            }
        }
    }
    Ok(())
}
