//! Scoring matcher - whole-document fallback disambiguation
//!
//! Used when structural relocation fails or under-specifies the location.
//! Every occurrence of the target text in the document's visible text is
//! enumerated (skipping text already inside highlight markers) and ranked
//! with contextual and positional signals. No candidate above the
//! acceptance threshold means "not found" - the matcher never guesses.

use crate::{
    clean_text, clean_text_with_marker_mask, nearest_container, normalize, resolve_raw_range,
    Anchor, ContainerDescriptor, EngineConfig, NodeRange, PositionMap,
};
use dom_model::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum context length that still counts as a partial context match
const PARTIAL_CONTEXT_LEN: usize = 10;

/// Scoring weights and acceptance threshold.
///
/// The default numbers are empirically observed to work, not derived;
/// they are policy, exposed as configuration rather than constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub exact_prefix: i32,
    pub partial_prefix: i32,
    pub exact_suffix: i32,
    pub partial_suffix: i32,
    pub tag_match: i32,
    pub class_match: i32,
    pub selector_match: i32,
    pub list_index_match: i32,
    pub prev_sibling_match: i32,
    pub next_sibling_match: i32,
    pub occurrence_match: i32,
    pub accept_threshold: i32,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            exact_prefix: 30,
            partial_prefix: 20,
            exact_suffix: 30,
            partial_suffix: 15,
            tag_match: 10,
            class_match: 10,
            selector_match: 20,
            list_index_match: 40,
            prev_sibling_match: 20,
            next_sibling_match: 20,
            occurrence_match: 15,
            accept_threshold: 30,
        }
    }
}

/// Size budget for a whole-document scan. `None` means unbounded; hosts
/// with very large pages should set a cap.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScanBudget {
    /// Stop scanning new containers once this many characters were examined
    pub max_chars: Option<usize>,
}

/// Contextual signals extracted from a stored anchor
#[derive(Debug, Clone, Default)]
pub struct ContextHints {
    /// Normalized text immediately before the match at creation time
    pub prefix: Option<String>,
    /// Normalized text immediately after the match at creation time
    pub suffix: Option<String>,
    /// The stored container fingerprint
    pub descriptor: Option<ContainerDescriptor>,
    /// Occurrence index of the match within its container at creation time
    pub occurrence_in_container: Option<usize>,
}

impl ContextHints {
    /// Derive hints from a persisted anchor's descriptor and location
    pub fn from_anchor(anchor: &Anchor, context_len: usize) -> Self {
        let stored = anchor.location.descriptor.clean_text();
        let stored_chars: Vec<char> = stored.chars().collect();
        let start = anchor.location.text_index.min(stored_chars.len());
        let end = (start + anchor.text.chars().count()).min(stored_chars.len());

        let prefix_start = start.saturating_sub(context_len);
        let prefix: String = stored_chars[prefix_start..start].iter().collect();
        let suffix_end = (end + context_len).min(stored_chars.len());
        let suffix: String = stored_chars[end..suffix_end].iter().collect();

        Self {
            prefix: non_empty(normalize(&prefix)),
            suffix: non_empty(normalize(&suffix)),
            descriptor: Some(anchor.location.descriptor.clone()),
            occurrence_in_container: Some(anchor.location.occurrence),
        }
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

/// A scored relocation candidate. Ephemeral; discarded once the best match
/// is chosen.
#[derive(Debug, Clone)]
pub struct Candidate {
    /// The container the occurrence was found in
    pub container: NodeId,
    /// Concrete per-text-node ranges of the occurrence
    pub ranges: Vec<NodeRange>,
    /// Character offset of the occurrence in the container's clean text
    pub text_index: usize,
    /// Occurrence index within the container
    pub occurrence: usize,
    /// Total score
    pub score: i32,
    selector_exact: bool,
}

/// Whole-document scanner ranking textual candidates
pub struct ScoringMatcher<'a> {
    tree: &'a DomTree,
    config: &'a EngineConfig,
}

impl<'a> ScoringMatcher<'a> {
    /// Create a matcher over the current tree
    pub fn new(tree: &'a DomTree, config: &'a EngineConfig) -> Self {
        Self { tree, config }
    }

    /// Scan the document for the best candidate for `text`, or `None` when
    /// nothing clears the acceptance threshold. Ties prefer a candidate
    /// whose container satisfies the stored descriptor selector exactly.
    pub fn best_candidate(&self, text: &str, hints: &ContextHints) -> Option<Candidate> {
        let needle = normalize(text);
        if needle.is_empty() {
            return None;
        }
        let needle_len = needle.chars().count();
        let weights = &self.config.weights;

        let mut best: Option<Candidate> = None;
        let mut scanned_chars = 0usize;
        for container in self.candidate_containers() {
            if let Some(max) = self.config.scan_budget.max_chars {
                if scanned_chars >= max {
                    tracing::debug!(scanned_chars, max, "scan budget exhausted, stopping");
                    break;
                }
            }
            let (clean, marker_mask) = clean_text_with_marker_mask(self.tree, container);
            scanned_chars += clean.chars().count();
            let map = PositionMap::build(&clean);
            let norm_chars: Vec<char> = map.normalized().chars().collect();

            for (occurrence, &norm_start) in map.occurrences(&needle).iter().enumerate() {
                let Some((raw_start, raw_end)) = map.raw_range(norm_start, norm_start + needle_len)
                else {
                    continue;
                };
                if marker_mask[raw_start..raw_end.min(marker_mask.len())]
                    .iter()
                    .any(|&m| m)
                {
                    continue;
                }
                let (score, selector_exact) =
                    self.score(container, &norm_chars, norm_start, needle_len, occurrence, hints);
                if score < weights.accept_threshold {
                    continue;
                }
                let better = match &best {
                    None => true,
                    Some(current) => {
                        score > current.score
                            || (score == current.score && selector_exact && !current.selector_exact)
                    }
                };
                if better {
                    best = Some(Candidate {
                        container,
                        ranges: resolve_raw_range(self.tree, container, raw_start, raw_end),
                        text_index: raw_start,
                        occurrence,
                        score,
                        selector_exact,
                    });
                }
            }
        }
        best
    }

    /// Meaningful containers of the document's visible text, deduplicated
    /// in document order
    fn candidate_containers(&self) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for text_node in self.tree.text_nodes_in(self.tree.root_id()) {
            let container = nearest_container(self.tree, text_node);
            if seen.insert(container) {
                result.push(container);
            }
        }
        result
    }

    fn score(
        &self,
        container: NodeId,
        norm_chars: &[char],
        norm_start: usize,
        needle_len: usize,
        occurrence: usize,
        hints: &ContextHints,
    ) -> (i32, bool) {
        let weights = &self.config.weights;
        let mut score = 0;
        let mut selector_exact = false;

        let before = &norm_chars[..norm_start];
        let after = &norm_chars[(norm_start + needle_len).min(norm_chars.len())..];

        if let Some(prefix) = &hints.prefix {
            let prefix_chars: Vec<char> = prefix.chars().collect();
            if !prefix_chars.is_empty() && before.ends_with(&prefix_chars) {
                score += weights.exact_prefix;
            } else if prefix_chars.len() >= PARTIAL_CONTEXT_LEN
                && before.ends_with(&prefix_chars[prefix_chars.len() - PARTIAL_CONTEXT_LEN..])
            {
                score += weights.partial_prefix;
            }
        }
        if let Some(suffix) = &hints.suffix {
            let suffix_chars: Vec<char> = suffix.chars().collect();
            if !suffix_chars.is_empty() && after.starts_with(&suffix_chars) {
                score += weights.exact_suffix;
            } else if suffix_chars.len() >= PARTIAL_CONTEXT_LEN
                && after.starts_with(&suffix_chars[..PARTIAL_CONTEXT_LEN])
            {
                score += weights.partial_suffix;
            }
        }

        if let Some(descriptor) = &hints.descriptor {
            if let Some(element) = self.tree.get_element(container) {
                if element.tag.matches(descriptor.tag()) {
                    score += weights.tag_match;
                }
                if let ContainerDescriptor::Element {
                    class_name: Some(class),
                    ..
                } = descriptor
                {
                    if element.has_class(class) {
                        score += weights.class_match;
                    }
                }
                if self.selector_matches(descriptor, container) {
                    score += weights.selector_match;
                    selector_exact = true;
                }
            }
            if let ContainerDescriptor::ListItem {
                item_index,
                prev_sibling_prefix,
                next_sibling_prefix,
                ..
            } = descriptor
            {
                score += self.score_list_position(
                    container,
                    *item_index,
                    prev_sibling_prefix.as_deref(),
                    next_sibling_prefix.as_deref(),
                );
            }
        }

        if hints.occurrence_in_container == Some(occurrence) {
            score += weights.occurrence_match;
        }

        (score, selector_exact)
    }

    /// Check the stored selector (tag plus any recorded id/class) exactly
    fn selector_matches(&self, descriptor: &ContainerDescriptor, container: NodeId) -> bool {
        let Some(element) = self.tree.get_element(container) else {
            return false;
        };
        if !element.tag.matches(descriptor.tag()) {
            return false;
        }
        match descriptor {
            ContainerDescriptor::Element {
                dom_id, class_name, ..
            } => {
                if let Some(dom_id) = dom_id {
                    if element.dom_id.as_deref() != Some(dom_id.as_str()) {
                        return false;
                    }
                }
                if let Some(class) = class_name {
                    if !element.has_class(class) {
                        return false;
                    }
                }
                true
            }
            ContainerDescriptor::ListItem { list_tag, .. } => self
                .tree
                .parent_of(container)
                .and_then(|p| self.tree.get_element(p))
                .map(|el| el.tag.matches(list_tag))
                .unwrap_or(false),
        }
    }

    fn score_list_position(
        &self,
        container: NodeId,
        item_index: usize,
        prev_prefix: Option<&str>,
        next_prefix: Option<&str>,
    ) -> i32 {
        let weights = &self.config.weights;
        let is_list_item = self
            .tree
            .get_element(container)
            .map(|el| el.tag.is_list_item())
            .unwrap_or(false);
        if !is_list_item {
            return 0;
        }
        let mut score = 0;
        if self.tree.sibling_index(container) == Some(item_index) {
            score += weights.list_index_match;
        }
        if let Some(prefix) = prev_prefix {
            let matches = self
                .tree
                .prev_sibling(container)
                .map(|sib| clean_text(self.tree, sib).starts_with(prefix))
                .unwrap_or(false);
            if matches {
                score += weights.prev_sibling_match;
            }
        }
        if let Some(prefix) = next_prefix {
            let matches = self
                .tree
                .next_sibling(container)
                .map(|sib| clean_text(self.tree, sib).starts_with(prefix))
                .unwrap_or(false);
            if matches {
                score += weights.next_sibling_match;
            }
        }
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_model::TreeBuilder;

    fn config() -> EngineConfig {
        EngineConfig::default()
    }

    fn hints_with_descriptor(descriptor: ContainerDescriptor) -> ContextHints {
        ContextHints {
            descriptor: Some(descriptor),
            ..ContextHints::default()
        }
    }

    #[test]
    fn test_below_threshold_is_not_found() {
        let mut builder = TreeBuilder::new();
        builder.element("p", |p| {
            p.text("some stray words");
        })
        .unwrap();
        let tree = builder.finish();

        let config = config();
        let matcher = ScoringMatcher::new(&tree, &config);
        // No hints at all: nothing can reach the 30-point threshold.
        assert!(matcher.best_candidate("stray", &ContextHints::default()).is_none());
    }

    #[test]
    fn test_context_prefix_and_suffix_select_the_right_occurrence() {
        let mut builder = TreeBuilder::new();
        builder.element("p", |p| {
            p.text("alpha target beta");
        })
        .unwrap();
        builder.element("p", |p| {
            p.text("gamma target delta");
        })
        .unwrap();
        let tree = builder.finish();

        let config = config();
        let matcher = ScoringMatcher::new(&tree, &config);
        let hints = ContextHints {
            prefix: Some("gamma ".to_string()),
            suffix: Some(" delta".to_string()),
            ..ContextHints::default()
        };
        let best = matcher.best_candidate("target", &hints).unwrap();
        let containers: Vec<_> = tree.elements_by_tag("p");
        assert_eq!(best.container, containers[1]);
        assert_eq!(best.text_index, 6);
    }

    #[test]
    fn test_reordered_list_item_found_by_sibling_context() {
        // Original order: [a, b, target]; the target moved to index 0.
        let mut builder = TreeBuilder::new();
        let list = builder
            .element("ul", |ul| {
                ul.child("li", |li| {
                    li.text("moved item text");
                })
                .child("li", |li| {
                    li.text("second entry");
                })
                .child("li", |li| {
                    li.text("third entry");
                });
            })
            .unwrap();
        // A decoy paragraph with the same text elsewhere.
        builder.element("p", |p| {
            p.text("moved item text");
        })
        .unwrap();
        let tree = builder.finish();

        let config = config();
        let matcher = ScoringMatcher::new(&tree, &config);
        let descriptor = ContainerDescriptor::ListItem {
            list_tag: "ul".to_string(),
            item_index: 2,
            clean_text: "moved item text".to_string(),
            prev_sibling_prefix: Some("second entry".to_string()),
            next_sibling_prefix: None,
        };
        let best = matcher
            .best_candidate("moved item", &hints_with_descriptor(descriptor))
            .unwrap();
        let items: Vec<_> = tree.children_of(list).to_vec();
        // Tag + selector still pick the list item over the paragraph decoy.
        assert_eq!(best.container, items[0]);
    }

    #[test]
    fn test_occurrences_inside_markers_are_skipped() {
        let mut builder = TreeBuilder::new();
        builder
            .element("p", |p| {
                p.dom_id("x").text("echo echo");
            })
            .unwrap();
        let mut tree = builder.finish();
        let text = tree.text_nodes_in(tree.root_id())[0];
        // Highlight the first "echo".
        let (first, _) = tree.split_text_node(text, 4).unwrap();
        tree.wrap_text_node_in_marker(first, "existing", "yellow").unwrap();

        let config = config();
        let matcher = ScoringMatcher::new(&tree, &config);
        let descriptor = ContainerDescriptor::Element {
            tag: "p".to_string(),
            dom_id: Some("x".to_string()),
            class_name: None,
            tag_index: 0,
            clean_text: "echo echo".to_string(),
        };
        let best = matcher
            .best_candidate("echo", &hints_with_descriptor(descriptor))
            .unwrap();
        // Only the unhighlighted occurrence qualifies.
        assert_eq!(best.text_index, 5);
    }

    #[test]
    fn test_scan_budget_caps_the_scan() {
        let mut builder = TreeBuilder::new();
        for _ in 0..10 {
            builder.element("p", |p| {
                p.text("padding padding padding padding");
            })
            .unwrap();
        }
        builder.element("p", |p| {
            p.dom_id("late").text("needle text here");
        })
        .unwrap();
        let tree = builder.finish();

        let mut config = config();
        config.scan_budget.max_chars = Some(50);
        let matcher = ScoringMatcher::new(&tree, &config);
        let descriptor = ContainerDescriptor::Element {
            tag: "p".to_string(),
            dom_id: Some("late".to_string()),
            class_name: None,
            tag_index: 10,
            clean_text: "needle text here".to_string(),
        };
        // The budget stops the scan before the matching container.
        assert!(matcher
            .best_candidate("needle", &hints_with_descriptor(descriptor))
            .is_none());
    }

    #[test]
    fn test_hints_from_anchor() {
        let descriptor = ContainerDescriptor::Element {
            tag: "p".to_string(),
            dom_id: None,
            class_name: None,
            tag_index: 0,
            clean_text: "alpha target beta".to_string(),
        };
        let anchor = Anchor::new(
            "target",
            crate::HighlightColor::Yellow,
            "page",
            crate::AnchorLocation {
                descriptor,
                text_index: 6,
                occurrence: 0,
            },
        );
        let hints = ContextHints::from_anchor(&anchor, 32);
        assert_eq!(hints.prefix.as_deref(), Some("alpha "));
        assert_eq!(hints.suffix.as_deref(), Some(" beta"));
        assert_eq!(hints.occurrence_in_container, Some(0));
    }
}
