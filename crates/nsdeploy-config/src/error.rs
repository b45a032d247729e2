use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error(
        "Config file not found. Looked in:\n\
        - NSDEPLOY_CONFIG_PATH\n\
        - current directory: nsdeploy.local.yaml, .nsdeploy.local.yaml, nsdeploy.yaml, .nsdeploy.yaml\n\
        - ~/.config/nsdeploy/nsdeploy.yaml"
    )]
    ConfigFileNotFound,

    #[error("Invalid method {0}")]
    InvalidTransport(String),

    #[error("Invalid environment '{0}'")]
    InvalidEnvironment(String),

    #[error("Missing required setting '{field}' for the {transport} method")]
    MissingField {
        field: &'static str,
        transport: &'static str,
    },

    #[error("Failed to parse {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
