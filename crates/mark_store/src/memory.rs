//! In-memory anchor store

use crate::{AnchorStore, Result};
use anchor_engine::Anchor;
use std::collections::HashMap;

/// Volatile store, for tests and single-session hosts
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: HashMap<String, Vec<Anchor>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pages with stored anchors
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl AnchorStore for MemoryStore {
    fn load(&self, page_key: &str) -> Result<Vec<Anchor>> {
        Ok(self.pages.get(page_key).cloned().unwrap_or_default())
    }

    fn save(&mut self, page_key: &str, anchors: &[Anchor]) -> Result<()> {
        self.pages.insert(page_key.to_string(), anchors.to_vec());
        Ok(())
    }

    fn remove(&mut self, page_key: &str) -> Result<()> {
        self.pages.remove(page_key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_engine::{Anchor, AnchorLocation, ContainerDescriptor, HighlightColor};

    fn sample_anchor(text: &str, page_key: &str) -> Anchor {
        Anchor::new(
            text,
            HighlightColor::Yellow,
            page_key,
            AnchorLocation {
                descriptor: ContainerDescriptor::Element {
                    tag: "p".to_string(),
                    dom_id: None,
                    class_name: None,
                    tag_index: 0,
                    clean_text: text.to_string(),
                },
                text_index: 0,
                occurrence: 0,
            },
        )
    }

    #[test]
    fn test_unknown_page_loads_empty() {
        let store = MemoryStore::new();
        assert!(store.load("nowhere").unwrap().is_empty());
    }

    #[test]
    fn test_save_load_remove() {
        let mut store = MemoryStore::new();
        let anchor = sample_anchor("hello", "page-a");
        store.save("page-a", &[anchor.clone()]).unwrap();
        assert_eq!(store.load("page-a").unwrap(), vec![anchor]);

        store.remove("page-a").unwrap();
        assert!(store.load("page-a").unwrap().is_empty());
        // Removing again is fine.
        store.remove("page-a").unwrap();
    }
}
