use chrono::NaiveDate;
use clap::{CommandFactory, Parser};
use painter::config::{CanvasConfig, ConfigError};
use painter::driver::CommitDriver;
use painter::logging;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::{error, info};
use vcs::{GitCli, VcsClient};

#[derive(Parser)]
#[command(name = "painter")]
#[command(about = "Paints pixel glyphs onto a contribution activity calendar")]
struct Cli {
    /// Backfill the pattern from this date (YYYY-MM-DD) up to today
    #[arg(long, value_name = "START_DATE")]
    setup: Option<String>,

    /// Create today's commits from the pattern
    #[arg(long)]
    daily: bool,

    /// Test SSH connectivity to the hosting service
    #[arg(long)]
    test_ssh: bool,

    /// Delete files outside the canvas pool and compact the store
    #[arg(long)]
    cleanup: bool,

    /// Reset the local working copy to match the remote
    #[arg(long)]
    reset: bool,

    /// Allow force pushes when even the lease-guarded push is refused
    #[arg(long)]
    force: bool,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Load configuration from a TOML file instead of the built-in defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("painter: {err}");
            process::exit(1);
        }
    };

    if let Err(err) = logging::init(&config.log_file, cli.debug) {
        eprintln!("painter: failed to open log file: {err}");
        process::exit(1);
    }

    let client: Arc<dyn VcsClient> = Arc::new(GitCli::new());
    let driver = CommitDriver::new(config.clone(), client.clone());

    // Operations are mutually exclusive; the first matching flag wins.
    let ok = if cli.test_ssh {
        test_ssh(&config, client.as_ref()).await
    } else if cli.reset {
        driver.repo().reset().await
    } else if let Some(start) = cli.setup.as_deref() {
        match NaiveDate::parse_from_str(start, "%Y-%m-%d") {
            Ok(date) => driver.backfill(date, cli.force).await,
            Err(err) => {
                error!(%err, start, "invalid start date, expected YYYY-MM-DD");
                false
            }
        }
    } else if cli.daily {
        driver.daily().await
    } else if cli.cleanup {
        driver.repo().cleanup().await
    } else {
        let _ = Cli::command().print_help();
        println!();
        true
    };

    process::exit(i32::from(!ok));
}

async fn test_ssh(config: &CanvasConfig, client: &dyn VcsClient) -> bool {
    let target = config.remote.ssh_probe_target();
    info!(%target, "testing ssh connection");
    match client.probe_ssh(&target).await {
        Ok(()) => {
            info!("ssh connection successful");
            true
        }
        Err(err) => {
            error!(%err, "ssh connection failed");
            false
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<CanvasConfig, ConfigError> {
    match path {
        Some(path) => CanvasConfig::load(path),
        None => Ok(CanvasConfig::default()),
    }
}
