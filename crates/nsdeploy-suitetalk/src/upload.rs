//! Upload orchestration
//!
//! Files are uploaded strictly one after another: later files may depend on
//! folders created for earlier ones. A folder id that NetSuite no longer
//! knows is re-resolved once; every other failure aborts the batch.

use crate::client::{FileCabinet, JAVASCRIPT_FILE_TYPE, Record};
use crate::error::{Result, SuiteTalkError};
use crate::folder::FolderResolver;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use nsdeploy_config::Environment;
use nsdeploy_core::{DeployCache, FileId, FolderId, RemotePath};
use std::path::{Component, Path, PathBuf};

/// What to upload and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Remote folder mirroring `base_dir`
    pub destination: RemotePath,
    pub base_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// A single file and the folder it goes to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub local: PathBuf,
    pub destination: RemotePath,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub local: PathBuf,
    pub remote_path: RemotePath,
    pub folder: FolderId,
    pub file_id: FileId,
}

pub struct Uploader<'a, C: FileCabinet + ?Sized> {
    cabinet: &'a C,
    folders: FolderResolver<'a, C>,
}

impl<'a, C: FileCabinet + ?Sized> Uploader<'a, C> {
    pub fn new(cabinet: &'a C, environment: Environment) -> Self {
        Self {
            cabinet,
            folders: FolderResolver::new(cabinet, environment),
        }
    }

    /// Work out the destination folder of every file, skipping directories
    pub async fn plan(&self, request: &UploadRequest) -> Result<Vec<UploadJob>> {
        let base = normalize(&std::path::absolute(&request.base_dir)?);
        let mut jobs = Vec::with_capacity(request.files.len());

        for file in &request.files {
            if tokio::fs::metadata(file).await?.is_dir() {
                tracing::debug!("Skipping directory {}", file.display());
                continue;
            }

            let local = normalize(&std::path::absolute(file)?);
            let relative = relative_dir(&local, &base)?;
            jobs.push(UploadJob {
                destination: request.destination.join(&relative),
                local,
            });
        }

        Ok(jobs)
    }

    /// Upload every file of `request`, stopping at the first failure
    pub async fn upload_all(
        &self,
        cache: &mut DeployCache,
        request: &UploadRequest,
    ) -> Result<Vec<UploadedFile>> {
        let jobs = self.plan(request).await?;
        let mut uploaded = Vec::with_capacity(jobs.len());

        for job in jobs {
            uploaded.push(self.upload(cache, job).await?);
        }

        Ok(uploaded)
    }

    /// Upload one file, recovering once from a stale cached folder id
    pub async fn upload(&self, cache: &mut DeployCache, job: UploadJob) -> Result<UploadedFile> {
        let name = job
            .local
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                SuiteTalkError::UnexpectedResponse(format!(
                    "{} has no file name",
                    job.local.display()
                ))
            })?;
        let content = STANDARD.encode(tokio::fs::read(&job.local).await?);

        let folder = self.folders.resolve(cache, &job.destination, false).await?;
        let (folder, file_id) = match self.add_file(&name, folder, &content).await {
            Ok(file_id) => (folder, file_id),
            Err(err) if err.is_stale_folder_reference(folder) => {
                tracing::warn!(
                    "Folder {} for {} no longer exists, resolving again",
                    folder,
                    job.destination
                );
                cache.remove(self.environment(), &job.destination.cache_key());

                let fresh = self.folders.resolve(cache, &job.destination, true).await?;
                match self.add_file(&name, fresh, &content).await {
                    Ok(file_id) => (fresh, file_id),
                    Err(err) if err.is_stale_folder_reference(fresh) => {
                        return Err(SuiteTalkError::StaleFolderReference {
                            folder_id: fresh,
                            path: job.destination.to_string(),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
            Err(err) => return Err(err),
        };

        tracing::info!("Uploaded {} to {} ({})", name, job.destination, file_id);
        Ok(UploadedFile {
            local: job.local,
            remote_path: job.destination,
            folder,
            file_id,
        })
    }

    async fn add_file(&self, name: &str, folder: FolderId, content: &str) -> Result<FileId> {
        let record = Record::File {
            name: name.to_string(),
            folder,
            content: content.to_string(),
            file_type: JAVASCRIPT_FILE_TYPE.to_string(),
        };
        self.cabinet.add(&record).await?.file_id()
    }

    fn environment(&self) -> &'static str {
        self.folders.environment().as_str()
    }
}

/// Collapse `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(normalized.components().next_back(), Some(Component::Normal(_))) {
                    normalized.pop();
                } else if !normalized.has_root() {
                    normalized.push(component);
                }
            }
            other => normalized.push(other),
        }
    }
    normalized
}

/// Directory of `file` relative to `base`, as a slash separated string
fn relative_dir(file: &Path, base: &Path) -> Result<String> {
    let outside = || SuiteTalkError::OutsideBase {
        file: file.to_path_buf(),
        base: base.to_path_buf(),
    };

    let dir = file.parent().ok_or_else(outside)?;
    let relative = dir.strip_prefix(base).map_err(|_| outside())?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(outside()),
        }
    }
    Ok(segments.join("/"))
}
