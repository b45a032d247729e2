//! File Cabinet identifiers and paths

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized, slash-separated folder path within the File Cabinet
///
/// Never has leading/trailing slashes or empty segments and only uses
/// forward slashes, so equal paths always produce equal cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath {
    segments: Vec<String>,
}

impl RemotePath {
    /// Normalize `raw` into a remote path
    ///
    /// Backslashes become forward slashes, surrounding whitespace and slashes
    /// are stripped and empty segments are dropped.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw
            .replace('\\', "/")
            .trim_matches(|c: char| c == '/' || c.is_whitespace())
            .split('/')
            .filter(|segment| !segment.trim().is_empty())
            .map(str::to_string)
            .collect();

        if segments.is_empty() {
            return Err(CoreError::EmptyRemotePath(raw.to_string()));
        }

        Ok(Self { segments })
    }

    /// Append a relative path (which may itself contain several segments)
    pub fn join(&self, relative: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(
            relative
                .replace('\\', "/")
                .split('/')
                .filter(|segment| !segment.trim().is_empty())
                .map(str::to_string),
        );
        Self { segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Key under which the resolved folder id is cached
    pub fn cache_key(&self) -> String {
        format!("folderIDs:{}", self)
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("/"))
    }
}

macro_rules! internal_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Zero is never issued by NetSuite and is rejected
            pub fn new(id: u64) -> Option<Self> {
                (id > 0).then_some(Self(id))
            }

            /// Parse an `internalId` attribute value
            pub fn parse(raw: &str) -> Option<Self> {
                raw.trim().parse::<u64>().ok().and_then(Self::new)
            }

            pub fn get(&self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

internal_id!(
    /// Internal id of a File Cabinet folder
    FolderId
);

internal_id!(
    /// Internal id of a File Cabinet file
    FileId
);
