//! Memoizing feature-name loader.
//!
//! Deriving the feature-name list of a model can mean loading its whole
//! training frame. The cache keeps those lists in a JSON file keyed by model
//! variant so repeated conversions skip that work:
//!
//! ```json
//! { "model_4_with_xtra": { "feature_names": ["...", "..."], "instr": "..." } }
//! ```
//!
//! It sits in front of the conversion pipeline; nothing inside the
//! pipeline reads or writes it.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConvertError, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub feature_names: Vec<String>,
    /// Sample input vector stored alongside the names, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instr: Option<String>,
}

#[derive(Debug)]
pub struct FeatureCache {
    path: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
    dirty: bool,
}

impl FeatureCache {
    /// Open a cache file. A missing file is an empty cache.
    pub fn open(path: &Path) -> Result<Self> {
        let entries = if path.exists() {
            let source = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
            serde_json::from_str(&source).map_err(|e| ConvertError::json(path, &source, e))?
        } else {
            debug!(path = %path.display(), "feature cache not found, starting empty");
            BTreeMap::new()
        };
        Ok(FeatureCache {
            path: path.to_path_buf(),
            entries,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&CacheEntry> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: &str, entry: CacheEntry) {
        self.entries.insert(key.to_string(), entry);
        self.dirty = true;
    }

    /// Cached names for `key`, computing and storing them on a miss.
    pub fn get_or_insert_with<F>(&mut self, key: &str, load: F) -> Result<&[String]>
    where
        F: FnOnce() -> Result<Vec<String>>,
    {
        if !self.entries.contains_key(key) {
            info!(key, "feature cache miss");
            let feature_names = load()?;
            self.insert(
                key,
                CacheEntry {
                    feature_names,
                    instr: None,
                },
            );
        }
        Ok(&self.entries[key].feature_names)
    }

    /// Write back if anything changed.
    pub fn save(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| ConvertError::InvalidInput(format!("cannot encode feature cache: {}", e)))?;
        std::fs::write(&self.path, text).map_err(|e| ConvertError::io(&self.path, e))?;
        self.dirty = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_miss_then_hit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feature_names_cache.json");

        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            Ok(vec!["a".to_string(), "b".to_string()])
        };

        let mut cache = FeatureCache::open(&path).unwrap();
        assert_eq!(cache.get_or_insert_with("model_1", load).unwrap(), ["a", "b"]);
        cache.save().unwrap();
        assert!(path.exists());

        let mut reopened = FeatureCache::open(&path).unwrap();
        let names = reopened
            .get_or_insert_with("model_1", || panic!("should be cached"))
            .unwrap();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reads_existing_format() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{
  "model_4_with_xtra": { "feature_names": ["x", "y", "z"], "instr": "\"1\", \"5\"" },
  "model_1": { "feature_names": ["x"] }
}"#,
        )
        .unwrap();
        let cache = FeatureCache::open(&path).unwrap();
        assert_eq!(cache.keys().collect::<Vec<_>>(), vec!["model_1", "model_4_with_xtra"]);
        let entry = cache.get("model_4_with_xtra").unwrap();
        assert_eq!(entry.feature_names.len(), 3);
        assert!(entry.instr.is_some());
    }

    #[test]
    fn test_loader_error_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let mut cache = FeatureCache::open(&dir.path().join("c.json")).unwrap();
        let err = cache
            .get_or_insert_with("m", || Err(ConvertError::InvalidInput("boom".to_string())))
            .unwrap_err();
        assert!(err.to_string().contains("boom"));
        assert!(cache.get("m").is_none());
    }
}
