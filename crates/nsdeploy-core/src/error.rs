//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Error {status} ({reason}) while retrieving domains: {message}")]
    RemoteService {
        status: u16,
        reason: String,
        message: String,
    },

    #[error("Unable to find a matching data center for role {role}")]
    NoMatchingDataCenter { role: String },

    #[error("Data center entry has no {0}")]
    MissingDomain(String),

    #[error("Remote path is empty: '{0}'")]
    EmptyRemotePath(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error(transparent)]
    Config(#[from] nsdeploy_config::ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
