pub mod cache;
pub mod deploy;

use nsdeploy_config::{ConfigError, DeployConfig};
use std::path::Path;

/// Load `explicit`, or the discovered config file if there is one
pub fn load_config(explicit: Option<&Path>) -> anyhow::Result<Option<DeployConfig>> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match nsdeploy_config::find_config_file() {
            Ok(path) => path,
            Err(ConfigError::ConfigFileNotFound) => return Ok(None),
            Err(err) => return Err(err.into()),
        },
    };

    tracing::debug!("Loading config from {}", path.display());
    Ok(Some(nsdeploy_config::load_config(&path)?))
}
