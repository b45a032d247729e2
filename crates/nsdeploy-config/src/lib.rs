pub mod error;
pub mod types;

pub use error::*;
pub use types::{
    DEFAULT_APPLICATION_ID, DEFAULT_CACHE_FILE, DEFAULT_SDFCLI, DeployConfig, Environment,
    FileSpec, Transport,
};

use std::path::{Path, PathBuf};

const CANDIDATES: [&str; 4] = [
    "nsdeploy.local.yaml",
    ".nsdeploy.local.yaml",
    "nsdeploy.yaml",
    ".nsdeploy.yaml",
];

/// Global config directory (`~/.config/nsdeploy`), created on first use
pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or(ConfigError::ConfigDirNotFound)?
        .join("nsdeploy");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Locate the deployment config file
///
/// Search order:
/// 1. `NSDEPLOY_CONFIG_PATH` environment variable
/// 2. current directory: nsdeploy.local.yaml, .nsdeploy.local.yaml, nsdeploy.yaml, .nsdeploy.yaml
/// 3. `~/.config/nsdeploy/nsdeploy.yaml`
pub fn find_config_file() -> Result<PathBuf> {
    if let Ok(config_path) = std::env::var("NSDEPLOY_CONFIG_PATH") {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Ok(path);
        }
    }

    let current_dir = std::env::current_dir()?;
    for filename in &CANDIDATES {
        let path = current_dir.join(filename);
        if path.exists() {
            return Ok(path);
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_config = config_dir.join("nsdeploy").join("nsdeploy.yaml");
        if global_config.exists() {
            return Ok(global_config);
        }
    }

    Err(ConfigError::ConfigFileNotFound)
}

/// Parse a YAML config file
pub fn load_config(path: &Path) -> Result<DeployConfig> {
    let content = std::fs::read_to_string(path)?;
    serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
        path: path.to_path_buf(),
        source,
    })
}
