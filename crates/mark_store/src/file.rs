//! JSON-file-backed anchor store
//!
//! One JSON document holds every page's anchors. Writes go to a sibling
//! temp file first and are renamed into place, so a crash mid-write leaves
//! the previous file intact. A corrupted file logs a warning and loads as
//! empty; hosts that would rather fail use `open_strict`.

use crate::{AnchorStore, Result, StoreError};
use anchor_engine::Anchor;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    pages: HashMap<String, Vec<Anchor>>,
}

impl Default for StoreFile {
    fn default() -> Self {
        Self {
            version: FORMAT_VERSION,
            pages: HashMap::new(),
        }
    }
}

/// Durable anchor store backed by one JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    pages: HashMap<String, Vec<Anchor>>,
}

impl FileStore {
    /// Open a store, creating it on first save. A corrupted or
    /// unsupported file is logged and replaced by an empty store on the
    /// next save.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pages = match Self::read(&path) {
            Ok(pages) => pages,
            Err(StoreError::Corrupted(reason)) => {
                tracing::warn!(path = %path.display(), %reason, "store file unreadable, starting empty");
                HashMap::new()
            }
            Err(err) => return Err(err),
        };
        Ok(Self { path, pages })
    }

    /// Open a store, failing on a corrupted or unsupported file instead of
    /// recovering to empty
    pub fn open_strict(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let pages = Self::read(&path)?;
        Ok(Self { path, pages })
    }

    fn read(path: &Path) -> Result<HashMap<String, Vec<Anchor>>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let json = std::fs::read_to_string(path)?;
        let file: StoreFile = serde_json::from_str(&json)
            .map_err(|err| StoreError::Corrupted(err.to_string()))?;
        if file.version > FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported store version {}",
                file.version
            )));
        }
        Ok(file.pages)
    }

    /// Write the whole store atomically: temp file in the same directory,
    /// then rename over the target.
    fn persist(&self) -> Result<()> {
        let file = StoreFile {
            version: FORMAT_VERSION,
            pages: self.pages.clone(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        let tmp = self.path.with_extension("tmp");
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages with stored anchors
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl AnchorStore for FileStore {
    fn load(&self, page_key: &str) -> Result<Vec<Anchor>> {
        Ok(self.pages.get(page_key).cloned().unwrap_or_default())
    }

    fn save(&mut self, page_key: &str, anchors: &[Anchor]) -> Result<()> {
        self.pages.insert(page_key.to_string(), anchors.to_vec());
        self.persist()
    }

    fn remove(&mut self, page_key: &str) -> Result<()> {
        if self.pages.remove(page_key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_engine::{AnchorLocation, ContainerDescriptor, HighlightColor};
    use tempfile::TempDir;

    fn sample_anchor(text: &str, page_key: &str) -> Anchor {
        Anchor::new(
            text,
            HighlightColor::Green,
            page_key,
            AnchorLocation {
                descriptor: ContainerDescriptor::Element {
                    tag: "p".to_string(),
                    dom_id: Some("intro".to_string()),
                    class_name: None,
                    tag_index: 0,
                    clean_text: format!("{text} and more"),
                },
                text_index: 0,
                occurrence: 0,
            },
        )
    }

    #[test]
    fn test_round_trip_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marks.json");

        let mut store = FileStore::open(&path).unwrap();
        let anchor = sample_anchor("hello", "page-a");
        store.save("page-a", &[anchor.clone()]).unwrap();
        store.save("page-b", &[sample_anchor("other", "page-b")]).unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.load("page-a").unwrap(), vec![anchor]);
        assert_eq!(reopened.page_count(), 2);
        assert!(reopened.load("never-saved").unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.load("any").unwrap().is_empty());
    }

    #[test]
    fn test_corrupted_file_recovers_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marks.json");
        std::fs::write(&path, "{ not json").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.load("page-a").unwrap().is_empty());

        assert!(matches!(
            FileStore::open_strict(&path),
            Err(StoreError::Corrupted(_))
        ));
    }

    #[test]
    fn test_future_version_is_rejected_strictly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marks.json");
        std::fs::write(&path, r#"{"version": 99, "pages": {}}"#).unwrap();

        assert!(matches!(
            FileStore::open_strict(&path),
            Err(StoreError::Corrupted(_))
        ));
        // Lenient open starts empty instead.
        assert_eq!(FileStore::open(&path).unwrap().page_count(), 0);
    }

    #[test]
    fn test_remove_persists_and_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("marks.json");

        let mut store = FileStore::open(&path).unwrap();
        store.save("page-a", &[sample_anchor("hello", "page-a")]).unwrap();
        store.remove("page-a").unwrap();
        store.remove("page-a").unwrap();

        let reopened = FileStore::open(&path).unwrap();
        assert!(reopened.load("page-a").unwrap().is_empty());
        assert!(!path.with_extension("tmp").exists());
    }
}
