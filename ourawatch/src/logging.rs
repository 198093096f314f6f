use anyhow::Result;
use chrono::Local;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing with file-based logging
/// Logs are written to ~/.config/ourawatch/logs/ourawatch-YYYY-MM-DD-HH-MM-SS.log
///
/// Stdout carries watch messages, so nothing is ever logged there. With
/// `verbose` a second layer mirrors events to stderr.
pub fn init_logging(verbose: bool) -> Result<PathBuf> {
    // Get config directory
    let config_dir = dirs::config_dir()
        .ok_or(anyhow::anyhow!("Could not find config directory"))?
        .join("ourawatch");

    // Create logs directory
    let logs_dir = config_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;

    // Create timestamped log file name
    let timestamp = Local::now().format("%Y-%m-%d-%H-%M-%S");
    let log_filename = format!("ourawatch-{}.log", timestamp);
    let log_path = logs_dir.join(&log_filename);

    // Create non-blocking file appender
    let file_appender = tracing_appender::rolling::never(&logs_dir, &log_filename);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    // Set up formatting layer for file output
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false) // No ANSI codes in log file
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true);

    // Set up stderr layer when running verbose
    let stderr_layer = verbose.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
    });

    // Set up filter (default to INFO, DEBUG when verbose, can be overridden with RUST_LOG)
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Initialize subscriber
    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();

    // Keep the guard alive for the lifetime of the program
    std::mem::forget(_guard);

    Ok(log_path)
}
