//! Text locator - relocating an anchor inside the current tree
//!
//! Container matching tries a ranked sequence of strategies; the first
//! success wins. Once a container is found, the occurrence is located in
//! its normalization-aware clean text and translated back to concrete
//! text-node offsets.

use crate::{clean_text, normalize, ContainerDescriptor, EngineConfig, PositionMap};
use dom_model::{DomTree, NodeId};
use serde::{Deserialize, Serialize};

/// A located span inside one text node (character offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRange {
    pub node: NodeId,
    pub start: usize,
    pub end: usize,
}

/// Expected steady-state failures of relocation on a changed page.
/// Neither aborts anything; the anchor simply stays stale this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocateError {
    /// No element in the current tree matches the container fingerprint
    ContainerMissing,
    /// The container was found but the text no longer occurs there at the
    /// expected occurrence index
    TextMissing,
}

/// Relocates anchors against the current tree state
pub struct TextLocator<'a> {
    tree: &'a DomTree,
    config: &'a EngineConfig,
}

impl<'a> TextLocator<'a> {
    /// Create a locator over the current tree
    pub fn new(tree: &'a DomTree, config: &'a EngineConfig) -> Self {
        Self { tree, config }
    }

    /// Relocate `text` at `occurrence` inside the container described by
    /// `descriptor`. Returns one range per spanned text node.
    pub fn locate(
        &self,
        descriptor: &ContainerDescriptor,
        text: &str,
        occurrence: usize,
    ) -> Result<Vec<NodeRange>, LocateError> {
        let container = self
            .find_container(descriptor)
            .ok_or(LocateError::ContainerMissing)?;
        self.ranges_in_container(container, text, occurrence)
            .ok_or(LocateError::TextMissing)
    }

    /// Find the container element matching a descriptor
    pub fn find_container(&self, descriptor: &ContainerDescriptor) -> Option<NodeId> {
        match descriptor {
            ContainerDescriptor::Element {
                tag,
                dom_id,
                class_name,
                tag_index,
                clean_text: stored,
            } => self.find_element(tag, dom_id.as_deref(), class_name.as_deref(), *tag_index, stored),
            ContainerDescriptor::ListItem {
                list_tag,
                item_index,
                clean_text: stored,
                ..
            } => self.find_list_item(list_tag, *item_index, stored),
        }
    }

    fn find_element(
        &self,
        tag: &str,
        dom_id: Option<&str>,
        class_name: Option<&str>,
        tag_index: usize,
        stored: &str,
    ) -> Option<NodeId> {
        // Strategy 1: id attribute wins outright.
        if let Some(dom_id) = dom_id {
            if let Some(el_id) = self.tree.element_by_dom_id(dom_id) {
                if self
                    .tree
                    .get_element(el_id)
                    .map(|el| el.tag.matches(tag))
                    .unwrap_or(false)
                {
                    return Some(el_id);
                }
            }
        }

        let same_tag = self.tree.elements_by_tag(tag);

        // Strategy 2: class scan with a prefix check on the clean text.
        if let Some(class) = class_name {
            for &el_id in &same_tag {
                let has_class = self
                    .tree
                    .get_element(el_id)
                    .map(|el| el.has_class(class))
                    .unwrap_or(false);
                if has_class && self.prefix_matches(el_id, stored) {
                    return Some(el_id);
                }
            }
            tracing::debug!(tag, class, "class strategy found no container, trying tag index");
        }

        // Strategy 3: same-tag document-order index, then a full same-tag scan.
        if let Some(&candidate) = same_tag.get(tag_index) {
            if self.prefix_matches(candidate, stored) {
                return Some(candidate);
            }
        }
        tracing::debug!(tag, tag_index, "tag index verification failed, scanning all same-tag elements");
        same_tag
            .into_iter()
            .find(|&el_id| self.prefix_matches(el_id, stored))
    }

    fn find_list_item(&self, list_tag: &str, item_index: usize, stored: &str) -> Option<NodeId> {
        let lists = self.tree.elements_by_tag(list_tag);

        // Strategy 4: direct index into each list of the recorded type.
        // List indices are precise, so verification requires clean-text
        // equality rather than a prefix check.
        for &list in &lists {
            let items = self.list_items(list);
            if let Some(&candidate) = items.get(item_index) {
                if clean_text(self.tree, candidate) == stored {
                    return Some(candidate);
                }
            }
        }
        tracing::debug!(list_tag, item_index, "list index verification failed, scanning by content");

        // Fallback: scan every item of that list type for a content match.
        let mut prefix_fallback = None;
        for &list in &lists {
            for candidate in self.list_items(list) {
                let text = clean_text(self.tree, candidate);
                if text == stored {
                    return Some(candidate);
                }
                if prefix_fallback.is_none() && self.prefix_matches(candidate, stored) {
                    prefix_fallback = Some(candidate);
                }
            }
        }
        prefix_fallback
    }

    fn list_items(&self, list: NodeId) -> Vec<NodeId> {
        self.tree
            .children_of(list)
            .iter()
            .copied()
            .filter(|&c| {
                self.tree
                    .get_element(c)
                    .map(|el| el.tag.is_list_item())
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Verify a candidate container by comparing a clean-text prefix against
    /// the stored descriptor text. The threshold is the minimum of the
    /// configured length and the stored text length, so short snippets are
    /// handled correctly.
    fn prefix_matches(&self, candidate: NodeId, stored: &str) -> bool {
        let stored_len = stored.chars().count();
        let threshold = self.config.prefix_check_len.min(stored_len);
        if threshold == 0 {
            return stored_len == 0;
        }
        let candidate_text = clean_text(self.tree, candidate);
        let mut candidate_chars = candidate_text.chars();
        let mut stored_chars = stored.chars();
        for _ in 0..threshold {
            match (candidate_chars.next(), stored_chars.next()) {
                (Some(a), Some(b)) if a == b => {}
                _ => return false,
            }
        }
        true
    }

    /// Locate the exact occurrence inside a known container and translate
    /// the abstract character range into text-node offsets
    pub fn ranges_in_container(
        &self,
        container: NodeId,
        text: &str,
        occurrence: usize,
    ) -> Option<Vec<NodeRange>> {
        let clean = clean_text(self.tree, container);
        let map = PositionMap::build(&clean);
        let needle = normalize(text);
        if needle.is_empty() {
            return None;
        }
        let starts = map.occurrences(&needle);
        let norm_start = *starts.get(occurrence)?;
        let (raw_start, raw_end) = map.raw_range(norm_start, norm_start + needle.chars().count())?;
        let ranges = resolve_raw_range(self.tree, container, raw_start, raw_end);
        if ranges.is_empty() {
            None
        } else {
            Some(ranges)
        }
    }
}

/// Translate a character range over a container's clean text into concrete
/// per-text-node ranges by walking text nodes in document order and
/// accumulating lengths. A match straddling several text nodes produces one
/// range per spanned node.
pub(crate) fn resolve_raw_range(
    tree: &DomTree,
    container: NodeId,
    raw_start: usize,
    raw_end: usize,
) -> Vec<NodeRange> {
    let mut ranges = Vec::new();
    let mut cursor = 0;
    for node in tree.text_nodes_in(container) {
        let len = match tree.get_text(node) {
            Some(t) => t.char_len(),
            None => continue,
        };
        let node_start = cursor;
        let node_end = cursor + len;
        cursor = node_end;
        if node_end <= raw_start {
            continue;
        }
        if node_start >= raw_end {
            break;
        }
        let start = raw_start.saturating_sub(node_start);
        let end = raw_end.min(node_end) - node_start;
        if start < end {
            ranges.push(NodeRange { node, start, end });
        }
    }
    ranges
}
