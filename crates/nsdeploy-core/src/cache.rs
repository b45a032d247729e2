//! Persistent deploy cache
//!
//! Manages the `.deploycache` file, which remembers resolved data center
//! domains and File Cabinet folder ids per environment so repeated deploys
//! skip discovery and folder lookups.
//!
//! The file is a nested JSON object. Keys are split on `:` so
//! `folderIDs:SuiteScripts/App` in the `sandbox` environment lives at
//! `sandbox -> folderIDs -> SuiteScripts/App`.

use crate::error::{CoreError, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

const BACKUP_SUFFIX: &str = "backup";

/// File-backed key-value store scoped by environment
///
/// Reads and writes happen in memory; nothing reaches the disk until
/// [`DeployCache::flush`] is called.
#[derive(Debug)]
pub struct DeployCache {
    path: PathBuf,
    root: Map<String, Value>,
}

impl DeployCache {
    /// Load the cache file, starting empty when it does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            tracing::debug!("Cache file {} not found, starting empty", path.display());
            return Ok(Self {
                path,
                root: Map::new(),
            });
        }

        let content = fs::read_to_string(&path).await?;
        let root = if content.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(&content)? {
                Value::Object(map) => map,
                other => {
                    return Err(CoreError::Cache(format!(
                        "{} must contain a JSON object, found {}",
                        path.display(),
                        json_kind(&other)
                    )));
                }
            }
        };

        tracing::debug!(
            "Loaded cache {} with {} environment(s)",
            path.display(),
            root.len()
        );
        Ok(Self { path, root })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a string value
    pub fn get_str(&self, environment: &str, key: &str) -> Option<&str> {
        self.lookup(environment, key)?.as_str()
    }

    /// Get a positive integer value
    ///
    /// Numeric strings are accepted because older cache files stored ids as
    /// strings. Zero counts as absent.
    pub fn get_u64(&self, environment: &str, key: &str) -> Option<u64> {
        let id = match self.lookup(environment, key)? {
            Value::Number(n) => n.as_u64()?,
            Value::String(s) => s.trim().parse().ok()?,
            _ => return None,
        };
        (id > 0).then_some(id)
    }

    /// Set a value, creating intermediate objects as needed
    pub fn set(&mut self, environment: &str, key: &str, value: impl Into<Value>) {
        let mut current = &mut self.root;
        for part in std::iter::once(environment).chain(parent_parts(key)) {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            current = match entry {
                Value::Object(map) => map,
                _ => unreachable!("entry was just replaced with an object"),
            };
        }
        current.insert(leaf(key).to_string(), value.into());
    }

    /// Remove a value, returning whether it existed
    pub fn remove(&mut self, environment: &str, key: &str) -> bool {
        let mut current = match self.root.get_mut(environment) {
            Some(Value::Object(map)) => map,
            _ => return false,
        };
        for part in parent_parts(key) {
            current = match current.get_mut(part) {
                Some(Value::Object(map)) => map,
                _ => return false,
            };
        }
        current.remove(leaf(key)).is_some()
    }

    /// Drop everything cached for one environment
    pub fn clear_environment(&mut self, environment: &str) -> bool {
        self.root.remove(environment).is_some()
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.root.clear();
    }

    /// Environments present in the cache
    pub fn environments(&self) -> Vec<&str> {
        self.root.keys().map(String::as_str).collect()
    }

    /// Flattened `(key, value)` pairs for one environment, keys joined with `:`
    pub fn entries(&self, environment: &str) -> Vec<(String, Value)> {
        let mut out = Vec::new();
        if let Some(Value::Object(map)) = self.root.get(environment) {
            flatten(map, None, &mut out);
        }
        out
    }

    /// Write the cache to disk, keeping the previous file as a backup
    pub async fn flush(&self) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await?;
        }

        if self.path.exists() {
            let backup = self.backup_path();
            if backup.exists() {
                fs::remove_file(&backup).await?;
            }
            fs::rename(&self.path, &backup).await?;
            tracing::debug!("Created cache backup {}", backup.display());
        }

        let content = serde_json::to_string_pretty(&Value::Object(self.root.clone()))?;
        fs::write(&self.path, content).await?;

        tracing::debug!("Saved cache {}", self.path.display());
        Ok(())
    }

    fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".");
        name.push(BACKUP_SUFFIX);
        self.path.with_file_name(name)
    }

    fn lookup(&self, environment: &str, key: &str) -> Option<&Value> {
        let mut current = self.root.get(environment)?;
        for part in key.split(':') {
            current = current.as_object()?.get(part)?;
        }
        Some(current)
    }
}

/// Every `:`-separated part of `key` except the last
fn parent_parts(key: &str) -> impl Iterator<Item = &str> {
    let parts: Vec<&str> = key.split(':').collect();
    let parents = parts.len().saturating_sub(1);
    parts.into_iter().take(parents)
}

fn leaf(key: &str) -> &str {
    key.rsplit(':').next().unwrap_or(key)
}

fn flatten(map: &Map<String, Value>, prefix: Option<&str>, out: &mut Vec<(String, Value)>) {
    for (key, value) in map {
        let full = match prefix {
            Some(prefix) => format!("{}:{}", prefix, key),
            None => key.clone(),
        };
        match value {
            Value::Object(inner) => flatten(inner, Some(&full), out),
            other => out.push((full, other.clone())),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
