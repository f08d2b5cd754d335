//! Anchor engine - the orchestrating facade
//!
//! Owns the tree for the duration of a page session and coordinates the
//! descriptor builder, locator, scoring matcher and batch mutator. Every
//! restore failure is isolated to its anchor: a page with some stale
//! anchors still restores the rest.

use crate::{
    clean_text, describe, nearest_container, normalize, resolve_raw_range, Anchor, AnchorId,
    AnchorLocation, BatchMutator, ContextHints, EngineConfig, EngineError, EngineEvent, EventSink,
    HighlightColor, MutationPlan, NullSink, PageAnchors, PositionMap, Result, ScoringMatcher,
    TextLocator, TextSelection,
};
use dom_model::{DomError, DomTree, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle of one anchor within a restore pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorState {
    /// Located in the current tree, but the wrap failed
    Resolved,
    /// Markers are in the tree
    Applied,
    /// Could not be located this session
    Stale,
}

/// Outcome for one anchor of a restore pass
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestoreDetail {
    pub id: AnchorId,
    pub state: AnchorState,
}

/// Aggregate outcome of a restore pass
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Anchors whose markers are now in the tree
    pub resolved: usize,
    /// Anchors left without markers this session
    pub stale: usize,
    /// Per-anchor outcomes, in processing order
    pub details: Vec<RestoreDetail>,
}

impl RestoreReport {
    /// Ids of anchors whose markers did not make it into the tree
    pub fn failed_ids(&self) -> Vec<AnchorId> {
        self.details
            .iter()
            .filter(|d| d.state != AnchorState::Applied)
            .map(|d| d.id)
            .collect()
    }

    /// Fold another report into this one (chunked sessions)
    pub fn merge(&mut self, other: RestoreReport) {
        self.resolved += other.resolved;
        self.stale += other.stale;
        self.details.extend(other.details);
    }
}

/// The anchoring engine for one page session
pub struct AnchorEngine {
    tree: DomTree,
    anchors: PageAnchors,
    page_key: String,
    config: EngineConfig,
    sink: Box<dyn EventSink>,
}

impl AnchorEngine {
    /// Create an engine over a tree with the default configuration
    pub fn new(tree: DomTree, page_key: impl Into<String>) -> Self {
        Self::with_config(tree, page_key, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration
    pub fn with_config(tree: DomTree, page_key: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            tree,
            anchors: PageAnchors::default(),
            page_key: page_key.into(),
            config,
            sink: Box::new(NullSink),
        }
    }

    /// Replace the event sink
    pub fn set_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sink = sink;
    }

    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    pub fn anchors(&self) -> &PageAnchors {
        &self.anchors
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Give the tree back to the host, dropping the session
    pub fn into_tree(self) -> DomTree {
        self.tree
    }

    pub(crate) fn emit(&mut self, event: EngineEvent) {
        self.sink.emit(event);
    }

    /// Create anchors from a selection and wrap them immediately.
    ///
    /// A selection spanning several containers is split into one independent
    /// anchor per container, so a later partial relocation degrades per
    /// container instead of all-or-nothing. Whitespace-only portions are
    /// skipped. Returns the created anchors, oldest container first.
    pub fn create(
        &mut self,
        selection: TextSelection,
        color: HighlightColor,
    ) -> Result<Vec<Anchor>> {
        if selection.is_collapsed() {
            return Err(EngineError::EmptySelection);
        }
        let selection = selection
            .normalized(&self.tree)
            .ok_or(EngineError::ContainerNotFound)?;

        let mut created = Vec::new();
        let mut plan = MutationPlan::new();
        for (container, raw_start, raw_end, first_node) in self.spanned_containers(&selection)? {
            let Some(anchor) =
                self.plan_container_anchor(container, raw_start, raw_end, first_node, color, &mut plan)?
            else {
                continue;
            };
            created.push(anchor);
        }
        if created.is_empty() {
            return Err(EngineError::EmptySelection);
        }

        let outcome = BatchMutator::new(&mut self.tree).apply(plan);
        let mut kept = Vec::new();
        let mut first_error = None;
        for anchor in created {
            if outcome.applied.iter().any(|id| *id == anchor.id.to_string()) {
                self.anchors.push(anchor.clone());
                self.sink.emit(EngineEvent::Created(anchor.clone()));
                kept.push(anchor);
            } else if first_error.is_none() {
                first_error = outcome
                    .failed
                    .iter()
                    .position(|(id, _)| *id == anchor.id.to_string())
                    .map(|_| EngineError::StructuralMutation("highlight wrap failed".to_string()));
            }
        }
        match (kept.is_empty(), first_error) {
            (true, Some(err)) => Err(err),
            (true, None) => Err(EngineError::EmptySelection),
            (false, _) => Ok(kept),
        }
    }

    /// Delete an anchor: unwrap its markers and drop the record. Idempotent;
    /// returns whether a record existed.
    pub fn delete(&mut self, id: AnchorId) -> Result<bool> {
        BatchMutator::new(&mut self.tree).unwrap_anchor(&id.to_string())?;
        let removed = self.anchors.remove(id).is_some();
        if removed {
            self.sink.emit(EngineEvent::Deleted(id));
        }
        Ok(removed)
    }

    /// Change an anchor's color, updating both the record and any live
    /// markers in place. Returns whether the anchor exists.
    pub fn recolor(&mut self, id: AnchorId, color: HighlightColor) -> Result<bool> {
        let Some(anchor) = self.anchors.get_mut(id) else {
            return Ok(false);
        };
        anchor.color = color;
        BatchMutator::new(&mut self.tree).recolor_anchor(&id.to_string(), color.name());
        self.sink.emit(EngineEvent::Recolored { id, color });
        Ok(true)
    }

    /// Attach or replace an anchor's note. Record-only; no tree effect.
    pub fn set_note(&mut self, id: AnchorId, note: Option<String>) -> bool {
        self.anchors.set_note(id, note)
    }

    /// Restore a page's persisted anchors in one batched pass.
    ///
    /// Each anchor is located independently; anchors whose text vanished
    /// stay stale without affecting the rest. All located ranges are applied
    /// as one mutation plan.
    pub fn restore_all(&mut self, anchors: Vec<Anchor>) -> RestoreReport {
        let report = self.restore_chunk(anchors);
        self.sink.emit(EngineEvent::Restored {
            resolved: report.resolved,
            stale: report.stale,
        });
        report
    }

    /// Locate and wrap one batch of anchors. Used by `restore_all` and by
    /// chunked restore sessions.
    pub(crate) fn restore_chunk(&mut self, anchors: Vec<Anchor>) -> RestoreReport {
        let mut plan = MutationPlan::new();
        let mut located: Vec<(Anchor, bool)> = Vec::new();
        for mut anchor in anchors {
            let ranges = self.locate_with_fallback(&mut anchor);
            match ranges {
                Some(ranges) => {
                    plan.add_highlight(&anchor.id.to_string(), anchor.color.name(), ranges);
                    located.push((anchor, true));
                }
                None => {
                    tracing::warn!(anchor_id = %anchor.id, text = %anchor.text, "anchor is stale this session");
                    located.push((anchor, false));
                }
            }
        }

        let outcome = BatchMutator::new(&mut self.tree).apply(plan);
        let mut report = RestoreReport::default();
        for (anchor, was_located) in located {
            let id = anchor.id;
            let applied = outcome.applied.iter().any(|a| *a == id.to_string());
            let state = if applied {
                AnchorState::Applied
            } else if was_located {
                tracing::warn!(anchor_id = %id, "located anchor failed to wrap");
                AnchorState::Resolved
            } else {
                AnchorState::Stale
            };
            if applied {
                report.resolved += 1;
            } else {
                report.stale += 1;
            }
            report.details.push(RestoreDetail { id, state });
            // Stale anchors keep their record: they stay listed and
            // deletable, just invisible this session.
            self.anchors.push(anchor);
        }
        report
    }

    /// Structural relocation first, then the scoring matcher. A scoring hit
    /// refreshes the anchor's stored location for the next session.
    fn locate_with_fallback(&mut self, anchor: &mut Anchor) -> Option<Vec<crate::NodeRange>> {
        let locate_result = {
            let locator = TextLocator::new(&self.tree, &self.config);
            locator.locate(
                &anchor.location.descriptor,
                &anchor.text,
                anchor.location.occurrence,
            )
        };
        match locate_result {
            Ok(ranges) => Some(ranges),
            Err(err) => {
                tracing::debug!(
                    anchor_id = %anchor.id,
                    ?err,
                    "structural relocation failed, consulting scoring matcher"
                );
                let hints = ContextHints::from_anchor(anchor, self.config.context_len);
                let candidate = {
                    let matcher = ScoringMatcher::new(&self.tree, &self.config);
                    matcher.best_candidate(&anchor.text, &hints)?
                };
                if let Ok((_, descriptor)) = describe(&self.tree, candidate.container, &self.config)
                {
                    anchor.location = AnchorLocation {
                        descriptor,
                        text_index: candidate.text_index,
                        occurrence: candidate.occurrence,
                    };
                }
                Some(candidate.ranges)
            }
        }
    }

    /// Split a normalized selection into per-container raw character ranges:
    /// `(container, raw_start, raw_end, first spanned text node)`.
    fn spanned_containers(
        &self,
        selection: &TextSelection,
    ) -> Result<Vec<(NodeId, usize, usize, NodeId)>> {
        let order = self.tree.text_nodes_in(self.tree.root_id());
        let start_idx = order
            .iter()
            .position(|&n| n == selection.start.node)
            .ok_or(EngineError::ContainerNotFound)?;
        let end_idx = order
            .iter()
            .position(|&n| n == selection.end.node)
            .ok_or(EngineError::ContainerNotFound)?;

        // Group the spanned text nodes by their nearest container; a
        // container's text nodes are contiguous in document order.
        let mut groups: Vec<(NodeId, Vec<(NodeId, usize, usize)>)> = Vec::new();
        for (idx, &node) in order.iter().enumerate().take(end_idx + 1).skip(start_idx) {
            let len = self
                .tree
                .get_text(node)
                .map(|t| t.char_len())
                .unwrap_or(0);
            let start = if idx == start_idx { selection.start.offset } else { 0 };
            let end = if idx == end_idx { selection.end.offset } else { len };
            if end > len {
                return Err(EngineError::Dom(DomError::InvalidOffset {
                    node: node.as_uuid(),
                    offset: end,
                    len,
                }));
            }
            if start >= end {
                continue;
            }
            let container = nearest_container(&self.tree, node);
            match groups.last_mut() {
                Some((c, spans)) if *c == container => spans.push((node, start, end)),
                _ => groups.push((container, vec![(node, start, end)])),
            }
        }

        let mut result = Vec::new();
        for (container, spans) in groups {
            let mut node_starts = HashMap::new();
            let mut cursor = 0;
            for n in self.tree.text_nodes_in(container) {
                node_starts.insert(n, cursor);
                cursor += self.tree.get_text(n).map(|t| t.char_len()).unwrap_or(0);
            }
            let (first_node, first_start, _) = spans[0];
            let (last_node, _, last_end) = *spans.last().unwrap_or(&spans[0]);
            let raw_start = node_starts.get(&first_node).copied().unwrap_or(0) + first_start;
            let raw_end = node_starts.get(&last_node).copied().unwrap_or(0) + last_end;
            result.push((container, raw_start, raw_end, first_node));
        }
        Ok(result)
    }

    /// Build the anchor for one container's slice of a selection and queue
    /// its wrap. Returns `None` for whitespace-only slices.
    fn plan_container_anchor(
        &self,
        container: NodeId,
        raw_start: usize,
        raw_end: usize,
        first_node: NodeId,
        color: HighlightColor,
        plan: &mut MutationPlan,
    ) -> Result<Option<Anchor>> {
        let clean = clean_text(&self.tree, container);
        let chars: Vec<char> = clean.chars().collect();
        let mut start = raw_start.min(chars.len());
        let mut end = raw_end.min(chars.len());
        while start < end && chars[start].is_whitespace() {
            start += 1;
        }
        while end > start && chars[end - 1].is_whitespace() {
            end -= 1;
        }
        if start == end {
            return Ok(None);
        }
        let text: String = chars[start..end].iter().collect();

        let map = PositionMap::build(&clean);
        let needle = normalize(&text);
        let starts = map.occurrences(&needle);
        let occurrence = starts
            .iter()
            .position(|&o| map.to_raw(o) == Some(start))
            .unwrap_or_else(|| {
                starts
                    .iter()
                    .filter(|&&o| map.to_raw(o).map(|r| r < start).unwrap_or(false))
                    .count()
            });

        let (_, descriptor) = describe(&self.tree, first_node, &self.config)?;
        let anchor = Anchor::new(
            text,
            color,
            self.page_key.clone(),
            AnchorLocation {
                descriptor,
                text_index: start,
                occurrence,
            },
        );
        plan.add_highlight(
            &anchor.id.to_string(),
            color.name(),
            resolve_raw_range(&self.tree, container, start, end),
        );
        Ok(Some(anchor))
    }
}
