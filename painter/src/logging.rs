use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stdout and appending to the
/// tool's log file. `RUST_LOG` overrides the default level when set.
pub fn init(log_file: &Path, debug: bool) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(log_file)?;

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(io::stdout.and(Arc::new(file)))
        .init();

    Ok(())
}
