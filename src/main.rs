use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use aurcheck::{manifest, pacman, rebuild, report};
use aurcheck::{reconcile, Config, FleetError, SyncEngine, Vercmp};

#[derive(Parser)]
#[command(name = "aurcheck")]
#[command(about = "Update AUR package clones and report what needs rebuilding")]
#[command(version)]
struct Cli {
    /// Store DIR as the AUR directory, then run
    #[arg(short, long, value_name = "DIR")]
    set: Option<PathBuf>,

    /// Skip the checkrebuild step
    #[arg(short, long)]
    ignore_rebuild: bool,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    debug!("Starting aurcheck v{}", env!("CARGO_PKG_VERSION"));

    if nix::unistd::Uid::effective().is_root() {
        println!("Do not run aurcheck as root.");
        return Ok(());
    }

    let (mut config, config_path) = load_config(cli.config)?;

    if let Some(dir) = &cli.set {
        match config.set_aur_directory(dir) {
            Ok(stored) => {
                config.save(&config_path)?;
                info!("AUR directory set to {}", stored.display());
            }
            Err(e) => {
                warn!("Rejected AUR directory {}: {:#}", dir.display(), e);
                println!("Could not set the AUR directory: {:#}", e);
            }
        }
    }

    let flagged = if cli.ignore_rebuild || !config.rebuild.enabled {
        debug!("Rebuild detection skipped");
        Vec::new()
    } else {
        detect_rebuilds().await
    };

    let Some(aur_dir) = config.aur_directory() else {
        println!("No AUR directory configured.");
        println!("Run `aurcheck --set <DIR>` or set {}.", aurcheck::config::AUR_DIRECTORY_ENV);
        return Ok(());
    };

    run(&config, &aur_dir, flagged).await
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    match config_path {
        Some(path) => Ok((Config::load_or_create(&path)?, path)),
        None => Ok((Config::load_or_default()?, Config::default_config_path()?)),
    }
}

/// Ask checkrebuild for broken packages; any failure means none this run
async fn detect_rebuilds() -> Vec<String> {
    match rebuild::detect_rebuilds().await {
        Ok(flagged) => {
            rebuild::print_flagged(&flagged);
            flagged
        }
        Err(e) => {
            warn!("Rebuild detection unavailable: {}", e);
            println!("Could not check for rebuilds: {}", e);
            Vec::new()
        }
    }
}

/// Synchronize, reconcile and present
async fn run(config: &Config, aur_dir: &Path, flagged: Vec<String>) -> Result<()> {
    let engine = SyncEngine::new(&config.sync);
    let summary = match engine.synchronize_all(aur_dir).await {
        Ok(summary) => summary,
        Err(FleetError::ToolUnavailable { program }) => {
            println!("{} is required but could not be launched. Is it installed?", program);
            return Ok(());
        }
        Err(e) => {
            println!("{}", e);
            return Ok(());
        }
    };

    let sources = manifest::collect_sources(aur_dir).await?;

    let installed = match pacman::installed_packages().await {
        Ok(installed) => installed,
        Err(e) => {
            println!("Could not list installed packages: {}", e);
            return Ok(());
        }
    };

    let pulled = summary.updated_names();
    let report = tokio::task::spawn_blocking(move || {
        reconcile(&sources, &installed, &pulled, &flagged, &Vercmp::new())
    })
    .await
    .context("Version comparison task failed")?;

    let report = match report {
        Ok(report) => report,
        Err(e) => {
            println!("Could not compare package versions: {}", e);
            return Ok(());
        }
    };

    if report::present(&report) {
        println!();
        println!("cd {}", aur_dir.display());
    }

    Ok(())
}
