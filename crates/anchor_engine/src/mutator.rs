//! Batch tree mutation - applying highlight wraps with minimal disruption
//!
//! Mutations are planned first and applied in one pass. Within a text node,
//! ranges are applied in descending start order: splitting keeps the left
//! half's node id, so wraps at higher offsets never invalidate pending
//! ranges at lower offsets. Entries fail independently; a failed entry's
//! markers are unwrapped and the remaining entries proceed.

use crate::{EngineError, NodeRange};
use dom_model::{DomTree, NodeId};
use std::collections::{HashMap, HashSet};

/// One planned highlight: every text-node range of one anchor occurrence
#[derive(Debug, Clone)]
struct PlanEntry {
    anchor_id: String,
    color: String,
    ranges: Vec<NodeRange>,
}

/// A batch of highlight wraps to apply in one pass
#[derive(Debug, Default)]
pub struct MutationPlan {
    entries: Vec<PlanEntry>,
}

impl MutationPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a highlight wrap for one anchor
    pub fn add_highlight(&mut self, anchor_id: &str, color: &str, ranges: Vec<NodeRange>) {
        self.entries.push(PlanEntry {
            anchor_id: anchor_id.to_string(),
            color: color.to_string(),
            ranges,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Result of applying a plan. Failures are per entry; the rest of the
/// batch is unaffected.
#[derive(Debug, Default)]
pub struct ApplyOutcome {
    /// Anchor ids whose markers are now in the tree
    pub applied: Vec<String>,
    /// Anchor ids that could not be wrapped, with the cause
    pub failed: Vec<(String, EngineError)>,
}

/// Applies planned mutations to a tree
pub struct BatchMutator<'a> {
    tree: &'a mut DomTree,
}

impl<'a> BatchMutator<'a> {
    pub fn new(tree: &'a mut DomTree) -> Self {
        Self { tree }
    }

    /// Apply every entry of the plan. Ranges are grouped per text node and
    /// processed in descending start order so that earlier wraps leave
    /// lower offsets valid.
    pub fn apply(&mut self, plan: MutationPlan) -> ApplyOutcome {
        let mut per_node: HashMap<NodeId, Vec<(usize, NodeRange)>> = HashMap::new();
        for (idx, entry) in plan.entries.iter().enumerate() {
            for range in &entry.ranges {
                per_node.entry(range.node).or_default().push((idx, *range));
            }
        }
        let mut node_order: Vec<NodeId> = per_node.keys().copied().collect();
        node_order.sort_by_key(|id| id.as_uuid());
        for ranges in per_node.values_mut() {
            ranges.sort_by(|a, b| b.1.start.cmp(&a.1.start).then(b.1.end.cmp(&a.1.end)));
        }

        let mut failed: Vec<Option<EngineError>> = Vec::new();
        failed.resize_with(plan.entries.len(), || None);
        let mut markers: Vec<Vec<NodeId>> = vec![Vec::new(); plan.entries.len()];
        let mut fully_wrapped: HashSet<NodeId> = HashSet::new();

        for node in node_order {
            for (idx, range) in &per_node[&node] {
                if failed[*idx].is_some() {
                    continue;
                }
                let entry = &plan.entries[*idx];
                match self.wrap_range(range, &entry.anchor_id, &entry.color, &fully_wrapped) {
                    Ok(marker) => {
                        markers[*idx].push(marker);
                        if range.start == 0 {
                            fully_wrapped.insert(range.node);
                        }
                    }
                    Err(err) => {
                        tracing::warn!(
                            anchor_id = %entry.anchor_id,
                            error = %err,
                            "highlight wrap failed, rolling back this anchor's markers"
                        );
                        self.rollback(&markers[*idx]);
                        markers[*idx].clear();
                        failed[*idx] = Some(err);
                    }
                }
            }
        }

        let mut outcome = ApplyOutcome::default();
        for (entry, failure) in plan.entries.into_iter().zip(failed) {
            match failure {
                None => outcome.applied.push(entry.anchor_id),
                Some(err) => outcome.failed.push((entry.anchor_id, err)),
            }
        }
        outcome
    }

    /// Wrap one character range of one text node in a marker. At most two
    /// splits: the slice boundaries become node boundaries and the new
    /// middle node is wrapped.
    fn wrap_range(
        &mut self,
        range: &NodeRange,
        anchor_id: &str,
        color: &str,
        fully_wrapped: &HashSet<NodeId>,
    ) -> crate::Result<NodeId> {
        if fully_wrapped.contains(&range.node) {
            return Err(EngineError::StructuralMutation(
                "range overlaps an already wrapped node".to_string(),
            ));
        }
        let len = self
            .tree
            .get_text(range.node)
            .ok_or_else(|| EngineError::StructuralMutation("range node is not text".to_string()))?
            .char_len();
        if range.start >= range.end || range.end > len {
            return Err(EngineError::StructuralMutation(format!(
                "range {}..{} is out of bounds for a node of length {len}",
                range.start, range.end
            )));
        }
        if range.end < len {
            self.tree.split_text_node(range.node, range.end)?;
        }
        let target = if range.start > 0 {
            let (_, right) = self.tree.split_text_node(range.node, range.start)?;
            right
        } else {
            range.node
        };
        Ok(self.tree.wrap_text_node_in_marker(target, anchor_id, color)?)
    }

    fn rollback(&mut self, markers: &[NodeId]) {
        for &marker in markers {
            if let Err(err) = self.tree.unwrap_marker(marker) {
                tracing::warn!(error = %err, "marker rollback failed");
            }
        }
    }

    /// Remove every marker of an anchor, splicing the text back and merging
    /// the resulting adjacent text nodes. Idempotent: unwrapping an anchor
    /// with no markers removes nothing.
    pub fn unwrap_anchor(&mut self, anchor_id: &str) -> crate::Result<usize> {
        let markers = self.tree.markers_with_anchor(anchor_id);
        let mut parents: Vec<NodeId> = Vec::new();
        for &marker in &markers {
            if let Some(parent) = self.tree.parent_of(marker) {
                if !parents.contains(&parent) {
                    parents.push(parent);
                }
            }
            self.tree.unwrap_marker(marker)?;
        }
        for parent in parents {
            self.tree.merge_adjacent_text_nodes(parent)?;
        }
        Ok(markers.len())
    }

    /// Change the color tag of every marker of an anchor in place. No
    /// structural change. Returns the number of markers updated.
    pub fn recolor_anchor(&mut self, anchor_id: &str, color: &str) -> usize {
        let markers = self.tree.markers_with_anchor(anchor_id);
        let count = markers.len();
        for marker in markers {
            if let Some(m) = self.tree.get_marker_mut(marker) {
                m.color = color.to_string();
            }
        }
        count
    }
}
