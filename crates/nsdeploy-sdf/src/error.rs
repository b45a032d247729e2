//! sdfcli driver errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SdfError {
    #[error("Failed to start {binary}: {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("sdfcli exited with {}", describe_exit(.code))]
    NonZeroExit { code: Option<i32> },

    #[error("sdfcli {0} is not piped")]
    PipeUnavailable(&'static str),

    #[error("No answer from the operator")]
    NoAnswer,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "a signal".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, SdfError>;
