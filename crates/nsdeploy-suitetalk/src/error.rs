//! SuiteTalk error types

use nsdeploy_core::FolderId;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SuiteTalkError {
    /// A write (add) call was rejected by NetSuite
    #[error("{message}")]
    RecordWrite {
        message: String,
        code: Option<String>,
    },

    /// A cached folder id was still rejected after re-resolving the path
    #[error("Invalid folder reference key {folder_id}. (folder '{path}' was re-resolved)")]
    StaleFolderReference { folder_id: FolderId, path: String },

    #[error("Search failed: {message}")]
    SearchFailed {
        message: String,
        code: Option<String>,
    },

    #[error("SOAP fault {code}: {message}")]
    SoapFault { code: String, message: String },

    #[error("Unexpected SuiteTalk response: {0}")]
    UnexpectedResponse(String),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("{} is not inside the base directory {}", file.display(), base.display())]
    OutsideBase { file: PathBuf, base: PathBuf },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] nsdeploy_core::CoreError),
}

impl SuiteTalkError {
    /// Whether NetSuite rejected `folder_id` as a folder that no longer exists
    pub fn is_stale_folder_reference(&self, folder_id: FolderId) -> bool {
        match self {
            SuiteTalkError::RecordWrite { message, .. } => {
                *message == format!("Invalid folder reference key {}.", folder_id)
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, SuiteTalkError>;
