use anyhow::{Context, Result};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing::Level;
use tracing_subscriber::{
    fmt::{self, time::ChronoLocal, writer::MakeWriterExt},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Terminal output (warnings and errors on stderr) plus an append-only copy in `log_path`.
pub fn init(log_path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
        .with_context(|| format!("Cannot open log file {}", log_path.display()))?;

    let terminal = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_ansi(true)
                .with_writer(terminal),
        )
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(ChronoLocal::rfc_3339())
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .try_init()
        .context("Tracing subscriber already installed")?;

    Ok(())
}
