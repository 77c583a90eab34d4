use clap::Parser;
use painter::config::CanvasConfig;
use painter::doctor::Doctor;
use painter::logging;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use vcs::{GitCli, VcsClient};

#[derive(Parser)]
#[command(name = "doctor")]
#[command(about = "Inspects and repairs the canvas working copy")]
struct Cli {
    /// Check repository status
    #[arg(long)]
    check: bool,

    /// Fix repository issues
    #[arg(long)]
    fix: bool,

    /// Reset the repository to a clean state
    #[arg(long)]
    reset: bool,

    /// Create a test commit to verify connectivity
    #[arg(long)]
    test_commit: bool,

    /// Pre-authorize destructive confirmation prompts
    #[arg(long)]
    yes: bool,

    /// Load configuration from a TOML file instead of the built-in defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => match CanvasConfig::load(path) {
            Ok(config) => Arc::new(config),
            Err(err) => {
                eprintln!("doctor: {err}");
                process::exit(1);
            }
        },
        None => Arc::new(CanvasConfig::default()),
    };

    if let Err(err) = logging::init(Path::new("doctor.log"), false) {
        eprintln!("doctor: failed to open log file: {err}");
        process::exit(1);
    }

    let client: Arc<dyn VcsClient> = Arc::new(GitCli::new());
    let doctor = Doctor::new(config, client);

    let ok = if cli.check {
        doctor.check()
    } else if cli.reset {
        let mut confirm = confirmation(cli.yes);
        doctor.reset(&mut confirm).await
    } else if cli.test_commit {
        doctor.test_commit().await
    } else if cli.fix {
        doctor.fix().await
    } else {
        // No flags: run the check suite and point at the repair commands.
        let ok = doctor.check();
        println!();
        println!("To fix repository issues, run: doctor --fix");
        println!("To create a test commit, run: doctor --test-commit");
        println!("To reset the repository, run: doctor --reset");
        ok
    };

    process::exit(i32::from(!ok));
}

/// Interactive yes/no prompt, short-circuited by `--yes` so the doctor can
/// run without an attached terminal.
fn confirmation(pre_authorized: bool) -> impl FnMut(&str) -> bool {
    move |prompt: &str| {
        if pre_authorized {
            return true;
        }
        print!("{prompt} (y/n): ");
        let _ = io::stdout().flush();
        let mut answer = String::new();
        if io::stdin().read_line(&mut answer).is_err() {
            return false;
        }
        answer.trim().eq_ignore_ascii_case("y")
    }
}
