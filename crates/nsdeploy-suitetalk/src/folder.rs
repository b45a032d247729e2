//! Folder path resolution
//!
//! Maps a [`RemotePath`] to the internal id of its last folder, walking the
//! File Cabinet one segment at a time and creating whatever is missing.
//! Only the id of a fully resolved path is written to the deploy cache.

use crate::client::{FileCabinet, Record, SearchCriteria};
use crate::error::{Result, SuiteTalkError};
use nsdeploy_config::Environment;
use nsdeploy_core::{DeployCache, FolderId, RemotePath};

pub struct FolderResolver<'a, C: FileCabinet + ?Sized> {
    cabinet: &'a C,
    environment: Environment,
}

impl<'a, C: FileCabinet + ?Sized> FolderResolver<'a, C> {
    pub fn new(cabinet: &'a C, environment: Environment) -> Self {
        Self {
            cabinet,
            environment,
        }
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Folder id for `path`, creating missing segments
    ///
    /// With `ignore_cache` the cached id is neither consulted nor trusted; the
    /// walk always runs and its result overwrites the cache entry.
    pub async fn resolve(
        &self,
        cache: &mut DeployCache,
        path: &RemotePath,
        ignore_cache: bool,
    ) -> Result<FolderId> {
        let key = path.cache_key();
        let environment = self.environment.as_str();

        if !ignore_cache
            && let Some(id) = cache.get_u64(environment, &key).and_then(FolderId::new)
        {
            tracing::debug!("Using cached folder id {} for {}", id, path);
            return Ok(id);
        }

        let mut parent: Option<FolderId> = None;
        for segment in path.segments() {
            let id = match self.search_folder(segment, parent).await? {
                Some(id) => id,
                None => self.create_folder(segment, parent).await?,
            };
            parent = Some(id);
        }

        // RemotePath is never empty, so the walk always yields an id
        let id = parent.ok_or_else(|| {
            SuiteTalkError::UnexpectedResponse(format!(
                "no folder resolved for {}",
                path
            ))
        })?;

        cache.set(environment, &key, id.get());
        tracing::debug!("Resolved {} to folder {}", path, id);
        Ok(id)
    }

    /// Exact-name lookup of `name` directly below `parent`
    pub async fn search_folder(
        &self,
        name: &str,
        parent: Option<FolderId>,
    ) -> Result<Option<FolderId>> {
        let criteria = SearchCriteria::Folder {
            name: name.to_string(),
            parent,
        };
        let result = self.cabinet.search(&criteria).await?.into_success()?;

        // The server-side "is" operator ignores case; records without a name are skipped
        Ok(result
            .records
            .iter()
            .filter(|record| record.name.as_deref() == Some(name))
            .find_map(|record| FolderId::new(record.internal_id)))
    }

    pub async fn create_folder(&self, name: &str, parent: Option<FolderId>) -> Result<FolderId> {
        let record = Record::Folder {
            name: name.to_string(),
            parent,
        };
        let id = self.cabinet.add(&record).await?.folder_id()?;

        match parent {
            Some(parent) => tracing::info!("Created folder '{}' ({}) in {}", name, id, parent),
            None => tracing::info!("Created top-level folder '{}' ({})", name, id),
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{FoundRecord, SearchResult, Status, WriteResponse};
    use crate::testing::MemoryCabinet;
    use tempfile::tempdir;

    async fn empty_cache(dir: &tempfile::TempDir) -> DeployCache {
        DeployCache::open(dir.path().join(".deploycache")).await.unwrap()
    }

    fn path(raw: &str) -> RemotePath {
        RemotePath::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_existing_prefix_then_create() {
        let cabinet = MemoryCabinet::new();
        let scripts = cabinet.insert_folder("SuiteScripts", None);
        let app = cabinet.insert_folder("App", Some(scripts));

        let dir = tempdir().unwrap();
        let mut cache = empty_cache(&dir).await;
        let resolver = FolderResolver::new(&cabinet, Environment::Sandbox);

        let id = resolver
            .resolve(&mut cache, &path("SuiteScripts/App/lib"), false)
            .await
            .unwrap();

        // Every segment is searched; only the missing one is created
        assert_eq!(cabinet.searches(), 3);
        assert_eq!(cabinet.folder_adds(), 1);
        assert_eq!(cabinet.folder_id("lib", Some(app)), Some(id.get()));
        assert_eq!(
            cache.get_u64("sandbox", "folderIDs:SuiteScripts/App/lib"),
            Some(id.get())
        );
        // Intermediate segments are not cached
        assert_eq!(cache.get_u64("sandbox", "folderIDs:SuiteScripts/App"), None);
    }

    #[tokio::test]
    async fn test_second_resolution_hits_cache() {
        let cabinet = MemoryCabinet::new();
        let dir = tempdir().unwrap();
        let mut cache = empty_cache(&dir).await;
        let resolver = FolderResolver::new(&cabinet, Environment::Production);

        let first = resolver
            .resolve(&mut cache, &path("/SuiteScripts/App/"), false)
            .await
            .unwrap();
        let searches = cabinet.searches();
        let adds = cabinet.folder_adds();

        let second = resolver
            .resolve(&mut cache, &path("SuiteScripts\\App"), false)
            .await
            .unwrap();

        assert_eq!(first, second);
        assert_eq!(cabinet.searches(), searches);
        assert_eq!(cabinet.folder_adds(), adds);
    }

    #[tokio::test]
    async fn test_ignore_cache_walks_and_overwrites() {
        let cabinet = MemoryCabinet::new();
        let dir = tempdir().unwrap();
        let mut cache = empty_cache(&dir).await;
        cache.set("sandbox", "folderIDs:SuiteScripts", 9999);

        let resolver = FolderResolver::new(&cabinet, Environment::Sandbox);
        let id = resolver
            .resolve(&mut cache, &path("SuiteScripts"), true)
            .await
            .unwrap();

        assert_ne!(id.get(), 9999);
        assert_eq!(cabinet.searches(), 1);
        assert_eq!(cabinet.folder_adds(), 1);
        assert_eq!(cache.get_u64("sandbox", "folderIDs:SuiteScripts"), Some(id.get()));
    }

    #[tokio::test]
    async fn test_cache_is_scoped_by_environment() {
        let cabinet = MemoryCabinet::new().with_folder("SuiteScripts", None);
        let dir = tempdir().unwrap();
        let mut cache = empty_cache(&dir).await;
        cache.set("production", "folderIDs:SuiteScripts", 5);

        let id = FolderResolver::new(&cabinet, Environment::Sandbox)
            .resolve(&mut cache, &path("SuiteScripts"), false)
            .await
            .unwrap();

        assert_ne!(id.get(), 5);
        assert_eq!(cabinet.searches(), 1);
        assert_eq!(cabinet.folder_adds(), 0);
    }

    #[tokio::test]
    async fn test_name_match_is_case_sensitive() {
        let cabinet = MemoryCabinet::new();
        let resolver = FolderResolver::new(&cabinet, Environment::Sandbox);
        cabinet.insert_folder("suitescripts", None);

        assert_eq!(
            resolver.search_folder("SuiteScripts", None).await.unwrap(),
            None
        );
    }

    /// Answers every search with the same records, like the server's
    /// case-insensitive "is" operator would
    struct LooseSearch(Vec<FoundRecord>);

    #[async_trait::async_trait]
    impl FileCabinet for LooseSearch {
        async fn search(&self, _criteria: &SearchCriteria) -> Result<SearchResult> {
            Ok(SearchResult {
                status: Status {
                    is_success: true,
                    details: Vec::new(),
                },
                total_records: self.0.len() as u64,
                records: self.0.clone(),
            })
        }

        async fn add(&self, _record: &Record) -> Result<WriteResponse> {
            Err(SuiteTalkError::UnexpectedResponse("read only".to_string()))
        }
    }

    #[tokio::test]
    async fn test_only_exact_names_are_accepted() {
        let cabinet = LooseSearch(vec![
            FoundRecord {
                internal_id: 10,
                name: None,
            },
            FoundRecord {
                internal_id: 11,
                name: Some("suitescripts".to_string()),
            },
            FoundRecord {
                internal_id: 12,
                name: Some("SuiteScripts".to_string()),
            },
        ]);
        let resolver = FolderResolver::new(&cabinet, Environment::Sandbox);

        assert_eq!(
            resolver.search_folder("SuiteScripts", None).await.unwrap(),
            FolderId::new(12)
        );
        assert_eq!(resolver.search_folder("Other", None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_create_failure_is_not_cached() {
        let cabinet = MemoryCabinet::new().with_folder("SuiteScripts", None);
        cabinet.fail_next_folder_add("You do not have permission to create folders.");

        let dir = tempdir().unwrap();
        let mut cache = empty_cache(&dir).await;
        let err = FolderResolver::new(&cabinet, Environment::Sandbox)
            .resolve(&mut cache, &path("SuiteScripts/App"), false)
            .await
            .unwrap_err();

        match err {
            SuiteTalkError::RecordWrite { message, code } => {
                assert_eq!(message, "You do not have permission to create folders.");
                assert!(code.is_some());
            }
            other => panic!("Expected RecordWrite, got {:?}", other),
        }
        assert!(cache.entries("sandbox").is_empty());
    }
}
