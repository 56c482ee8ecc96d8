use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging: stderr always, duplicated into a file when one is
/// given. Filtering follows `RUST_LOG`, defaulting to `info`.
pub fn init_logging(log_file: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    match log_file {
        Some(filename) => init_dual_logging(filename),
        None => init_console_logging(),
    }
}

/// Console-only logging (stderr)
fn init_console_logging() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
    Ok(())
}

/// Dual logging: both console (stderr) and file
fn init_dual_logging(filename: &str) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(filename)?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_writer(file).with_ansi(false))
        .init();
    Ok(())
}
