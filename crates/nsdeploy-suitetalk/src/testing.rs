//! In-memory File Cabinet used by the unit tests

use crate::client::{
    FileCabinet, FoundRecord, Record, SearchCriteria, SearchResult, Status, StatusDetail,
    WriteResponse,
};
use crate::error::Result;
use async_trait::async_trait;
use nsdeploy_core::FolderId;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub struct StoredFolder {
    pub id: u64,
    pub name: String,
    pub parent: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub id: u64,
    pub name: String,
    pub folder: u64,
    pub content: String,
}

#[derive(Default)]
struct State {
    next_id: u64,
    folders: Vec<StoredFolder>,
    files: Vec<StoredFile>,
    folder_failures: VecDeque<String>,
    file_failures: VecDeque<String>,
}

/// Behaves like NetSuite for folder searches and adds; uploading into a
/// folder id that does not exist fails with the stale reference message.
#[derive(Default)]
pub struct MemoryCabinet {
    state: Mutex<State>,
    pub searches: AtomicUsize,
    pub folder_adds: AtomicUsize,
    pub file_adds: AtomicUsize,
}

impl MemoryCabinet {
    pub fn new() -> Self {
        let cabinet = Self::default();
        cabinet.state.lock().unwrap().next_id = 100;
        cabinet
    }

    pub fn with_folder(self, name: &str, parent: Option<u64>) -> Self {
        self.insert_folder(name, parent);
        self
    }

    pub fn insert_folder(&self, name: &str, parent: Option<u64>) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.folders.push(StoredFolder {
            id,
            name: name.to_string(),
            parent,
        });
        id
    }

    /// Simulate a folder deleted in NetSuite behind the cache's back
    pub fn delete_folder(&self, id: u64) {
        self.state.lock().unwrap().folders.retain(|f| f.id != id);
    }

    pub fn folder_id(&self, name: &str, parent: Option<u64>) -> Option<u64> {
        self.state
            .lock()
            .unwrap()
            .folders
            .iter()
            .find(|f| f.name == name && f.parent == parent)
            .map(|f| f.id)
    }

    pub fn files(&self) -> Vec<StoredFile> {
        self.state.lock().unwrap().files.clone()
    }

    /// Make the next folder add fail with `message`
    pub fn fail_next_folder_add(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .folder_failures
            .push_back(message.to_string());
    }

    /// Make the next file add fail with `message`
    pub fn fail_next_file_add(&self, message: &str) {
        self.state
            .lock()
            .unwrap()
            .file_failures
            .push_back(message.to_string());
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    pub fn folder_adds(&self) -> usize {
        self.folder_adds.load(Ordering::SeqCst)
    }

    pub fn file_adds(&self) -> usize {
        self.file_adds.load(Ordering::SeqCst)
    }
}

fn failure(message: String) -> WriteResponse {
    WriteResponse {
        status: Status {
            is_success: false,
            details: vec![StatusDetail {
                code: Some("INVALID_KEY_OR_REF".to_string()),
                message,
            }],
        },
        base_ref: None,
    }
}

fn created(id: u64) -> WriteResponse {
    WriteResponse {
        status: Status {
            is_success: true,
            details: Vec::new(),
        },
        base_ref: Some(id),
    }
}

fn raw(id: Option<FolderId>) -> Option<u64> {
    id.map(|id| id.get())
}

#[async_trait]
impl FileCabinet for MemoryCabinet {
    async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResult> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        let SearchCriteria::Folder { name, parent } = criteria;
        let state = self.state.lock().unwrap();

        let records: Vec<FoundRecord> = state
            .folders
            .iter()
            .filter(|f| f.name == *name && f.parent == raw(*parent))
            .map(|f| FoundRecord {
                internal_id: f.id,
                name: Some(f.name.clone()),
            })
            .collect();

        Ok(SearchResult {
            status: Status {
                is_success: true,
                details: Vec::new(),
            },
            total_records: records.len() as u64,
            records,
        })
    }

    async fn add(&self, record: &Record) -> Result<WriteResponse> {
        match record {
            Record::Folder { name, parent } => {
                self.folder_adds.fetch_add(1, Ordering::SeqCst);
                let scripted = self.state.lock().unwrap().folder_failures.pop_front();
                if let Some(message) = scripted {
                    return Ok(failure(message));
                }
                Ok(created(self.insert_folder(name, raw(*parent))))
            }
            Record::File {
                name,
                folder,
                content,
                ..
            } => {
                self.file_adds.fetch_add(1, Ordering::SeqCst);
                let mut state = self.state.lock().unwrap();
                if let Some(message) = state.file_failures.pop_front() {
                    return Ok(failure(message));
                }
                if !state.folders.iter().any(|f| f.id == folder.get()) {
                    return Ok(failure(format!("Invalid folder reference key {}.", folder)));
                }
                state.next_id += 1;
                let id = state.next_id;
                state.files.push(StoredFile {
                    id,
                    name: name.clone(),
                    folder: folder.get(),
                    content: content.clone(),
                });
                Ok(created(id))
            }
        }
    }
}
