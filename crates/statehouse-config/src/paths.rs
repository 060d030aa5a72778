//! Configuration and cache directory paths
//!
//! Uses XDG directories via `dirs` crate.
//!
//! Platform-specific locations:
//! - Linux: `~/.config/statehouse/`, `~/.cache/statehouse/`
//! - macOS: `~/Library/Application Support/statehouse/`, `~/Library/Caches/statehouse/`
//! - Windows: `%APPDATA%\statehouse\`, `%LOCALAPPDATA%\statehouse\`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

const APP_NAME: &str = "statehouse";

/// Get the application config directory, creating it if needed
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    ensure_app_dir(&base)
}

/// Get the application cache directory, creating it if needed
pub fn cache_dir() -> Result<PathBuf> {
    let base = dirs::cache_dir().context("Could not determine cache directory")?;
    ensure_app_dir(&base)
}

/// Get path to app config file
pub fn app_config_path() -> Result<PathBuf> {
    let base = dirs::config_dir().context("Could not determine config directory")?;
    Ok(base.join(APP_NAME).join("config.toml"))
}

fn ensure_app_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(APP_NAME);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    Ok(dir)
}
