//! SuiteTalk transport
//!
//! Uploads files into the NetSuite File Cabinet over the SOAP web services,
//! creating the destination folder hierarchy on demand.

pub mod client;
pub mod error;
pub mod folder;
pub mod soap;
pub mod upload;

#[cfg(test)]
mod testing;

pub use client::{
    FileCabinet, FoundRecord, JAVASCRIPT_FILE_TYPE, Record, SearchCriteria, SearchResult, Status,
    StatusDetail, SuiteTalkClient, WriteResponse,
};
pub use error::{Result, SuiteTalkError};
pub use folder::FolderResolver;
pub use upload::{UploadJob, UploadRequest, UploadedFile, Uploader};
