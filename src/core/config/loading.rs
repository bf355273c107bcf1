//! Locates and parses the optional TOML configuration file.

use super::file::ConfigFile;
use crate::core::error::{AppError, Result};
use std::path::{Path, PathBuf};

const LOCAL_CONFIG_NAME: &str = "mailprobe.toml";

fn default_search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];
    if let Ok(home) = std::env::var("HOME") {
        paths.push(PathBuf::from(format!("{}/.config/mailprobe/config.toml", home)));
    }
    paths
}

/// Loads the configuration file.
///
/// An explicit path must exist. Without one, the default locations are tried in
/// order and a missing file simply yields `None`.
pub fn load_config_file(explicit: Option<&Path>) -> Result<Option<(ConfigFile, String)>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(AppError::Config(format!(
                "config file '{}' not found",
                path.display()
            )));
        }
        return parse_file(path).map(Some);
    }

    for candidate in default_search_paths() {
        if candidate.is_file() {
            return parse_file(&candidate).map(Some);
        }
    }
    tracing::debug!("No configuration file found; using defaults");
    Ok(None)
}

fn parse_file(path: &Path) -> Result<(ConfigFile, String)> {
    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = toml::from_str(&contents)?;
    tracing::info!("Loaded configuration from {}", path.display());
    Ok((parsed, path.display().to_string()))
}
