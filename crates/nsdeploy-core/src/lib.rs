//! nsdeploy core
//!
//! Building blocks shared by both deployment methods:
//!
//! - [`DeployCache`]: the `.deploycache` file remembering domains and folder ids
//! - [`DomainResolver`]: data center discovery through the REST roles service
//! - [`RemotePath`], [`FolderId`], [`FileId`]: File Cabinet addressing
//! - [`Credentials`]: the NetSuite login used by every remote call

pub mod cache;
pub mod credentials;
pub mod domain;
pub mod error;
pub mod model;

pub use cache::DeployCache;
pub use credentials::Credentials;
pub use domain::{DomainKind, DomainResolver, HttpRolesService, RolesResponse, RolesService};
pub use error::{CoreError, Result};
pub use model::{FileId, FolderId, RemotePath};
