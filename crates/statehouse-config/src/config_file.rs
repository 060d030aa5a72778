use std::{env, path::PathBuf};

pub const CONFIG_FILE: &str = ".statehouse.toml";

/// Load config file content
///
/// Searches for the config in:
/// 1. Current working directory as .statehouse.toml
/// 2. Home directory as .statehouse.toml
/// 3. The application config directory as config.toml
///
/// Returns the file content if found, None otherwise.
pub fn load_config_file() -> Option<String> {
    candidate_paths()
        .into_iter()
        .find_map(|path| match std::fs::read_to_string(&path) {
            Ok(content) => {
                log::debug!("Loaded config from {}", path.display());
                Some(content)
            }
            Err(_) => None,
        })
}

fn candidate_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(CONFIG_FILE)];
    if let Some(home_config) = get_home_config_path() {
        paths.push(home_config);
    }
    if let Ok(app_config) = crate::paths::app_config_path() {
        paths.push(app_config);
    }
    paths
}

/// Get the path to the config file in the home directory
///
/// Returns ~/.statehouse.toml if HOME environment variable is set.
fn get_home_config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(CONFIG_FILE))
}
