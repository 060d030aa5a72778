//! File-based logging using simplelog
//!
//! Log file location depends on build type:
//! - Debug builds: current working directory (for development convenience)
//! - Release builds: cache directory (~/.cache/statehouse/ on Linux)

use anyhow::{Context, Result};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use std::path::PathBuf;

/// Get the log file path based on build type
fn log_file_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let filename = format!("statehouse-counter-{}.log", timestamp);

    if cfg!(debug_assertions) {
        PathBuf::from(filename)
    } else {
        statehouse_config::cache_dir()
            .map(|dir| dir.join(&filename))
            .unwrap_or_else(|_| PathBuf::from(filename))
    }
}

/// Map a level name to a filter, falling back to Info
fn parse_level(name: &str) -> LevelFilter {
    match name.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// `RUST_LOG` wins over the configured level
fn effective_level(rust_log: Option<&str>, configured_level: &str) -> LevelFilter {
    parse_level(rust_log.unwrap_or(configured_level))
}

/// Initialize file-based logging
///
/// Everything is recorded until [`apply_level`] narrows it down, so messages
/// logged while the configuration loads are not lost.
/// Returns the path to the log file.
pub fn init() -> Result<PathBuf> {
    let log_file = log_file_path();

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c) // Fallback if local time offset fails
        .build();

    let file = File::create(&log_file)
        .with_context(|| format!("Failed to create log file {}", log_file.display()))?;

    WriteLogger::init(LevelFilter::Trace, config, file).context("Failed to initialize logger")?;

    Ok(log_file)
}

/// Restrict logging to the configured level (or `RUST_LOG`)
pub fn apply_level(configured_level: &str) -> LevelFilter {
    let rust_log = std::env::var("RUST_LOG").ok();
    let level = effective_level(rust_log.as_deref(), configured_level);
    log::set_max_level(level);
    level
}
