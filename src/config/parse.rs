//! Taskfile parsing and discovery

use crate::config::types::Config;
use crate::error::{ChoreError, ConfigError, ConfigResult};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default Taskfile names to search for
const CONFIG_FILE_NAMES: &[&str] = &["Taskfile.yml", "Taskfile.yaml"];

/// Find the Taskfile by searching current and parent directories
pub fn find_config_file() -> ConfigResult<PathBuf> {
    find_config_file_from(env::current_dir().map_err(|e| {
        ConfigError::Invalid(format!("Failed to get current directory: {}", e))
    })?)
}

/// Find the Taskfile starting from a specific directory
pub fn find_config_file_from(start_dir: PathBuf) -> ConfigResult<PathBuf> {
    let mut current_dir = start_dir;
    let mut searched_paths = Vec::new();

    loop {
        for file_name in CONFIG_FILE_NAMES {
            let config_path = current_dir.join(file_name);
            searched_paths.push(config_path.display().to_string());

            if config_path.is_file() {
                return Ok(config_path);
            }
        }

        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => return Err(ConfigError::NotFound(searched_paths.join(", "))),
        }
    }
}

/// Parse a Taskfile from a path
pub fn parse_config_file(path: &Path) -> Result<Config, ChoreError> {
    let contents = fs::read_to_string(path).map_err(|error| ConfigError::Read {
        path: path.to_path_buf(),
        error,
    })?;

    parse_config(&contents)
}

/// Parse a Taskfile from a string
pub fn parse_config(yaml: &str) -> Result<Config, ChoreError> {
    let config: Config = serde_yaml::from_str(yaml)?;
    tracing::debug!(tasks = config.tasks.len(), "parsed taskfile");
    Ok(config)
}

/// Parse the Taskfile with automatic discovery
pub fn parse_config_auto() -> Result<(Config, PathBuf), ChoreError> {
    let config_path = find_config_file()?;
    let config = parse_config_file(&config_path)?;
    Ok((config, config_path))
}
