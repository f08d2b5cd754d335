//! Container descriptors - serializable fingerprints of highlight containers

use crate::{clean_text, EngineConfig, EngineError, Result};
use dom_model::{DomTree, NodeId};
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Fingerprint of the smallest meaningful ancestor containing a selection.
///
/// This is not a live reference: it stays comparable even if the underlying
/// tree is rebuilt between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContainerDescriptor {
    /// A block-level element container
    Element {
        /// Lowercased tag name
        tag: String,
        /// The `id` attribute, if present
        #[serde(default, skip_serializing_if = "Option::is_none")]
        dom_id: Option<String>,
        /// First class token, if present
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class_name: Option<String>,
        /// Document-order index among elements with the same tag
        tag_index: usize,
        /// Full clean text of the container at creation time
        clean_text: String,
    },
    /// A list item container
    ListItem {
        /// Tag of the enclosing list (`ul` or `ol`)
        list_tag: String,
        /// Index among the list's item children
        item_index: usize,
        /// Full clean text of the item at creation time
        clean_text: String,
        /// Short clean-text prefix of the previous sibling item
        #[serde(default, skip_serializing_if = "Option::is_none")]
        prev_sibling_prefix: Option<String>,
        /// Short clean-text prefix of the next sibling item
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_sibling_prefix: Option<String>,
    },
}

impl ContainerDescriptor {
    /// The clean text recorded at creation time
    pub fn clean_text(&self) -> &str {
        match self {
            ContainerDescriptor::Element { clean_text, .. } => clean_text,
            ContainerDescriptor::ListItem { clean_text, .. } => clean_text,
        }
    }

    /// The container's tag name (`li` for list items)
    pub fn tag(&self) -> &str {
        match self {
            ContainerDescriptor::Element { tag, .. } => tag,
            ContainerDescriptor::ListItem { .. } => "li",
        }
    }
}

/// Find the nearest meaningful container of a node: the first list item
/// among its ancestors if one exists, else the nearest block-level ancestor
/// from the allow-list, else the tree root.
pub fn nearest_container(tree: &DomTree, node: NodeId) -> NodeId {
    let mut nearest_block = None;
    let chain = if tree.get_element(node).is_some() {
        let mut c = vec![node];
        c.extend(tree.ancestors(node));
        c
    } else {
        tree.ancestors(node)
    };
    for ancestor in chain {
        if let Some(el) = tree.get_element(ancestor) {
            if el.tag.is_list_item() {
                return ancestor;
            }
            if nearest_block.is_none() && el.tag.is_block_container() {
                nearest_block = Some(ancestor);
            }
        }
    }
    nearest_block.unwrap_or_else(|| tree.root_id())
}

/// Build the descriptor for the container of a selection start node.
/// Returns the container node id alongside the fingerprint.
pub fn describe(
    tree: &DomTree,
    start_node: NodeId,
    config: &EngineConfig,
) -> Result<(NodeId, ContainerDescriptor)> {
    if tree.node_kind(start_node).is_none() {
        return Err(EngineError::ContainerNotFound);
    }
    let container = nearest_container(tree, start_node);
    let element = tree
        .get_element(container)
        .ok_or(EngineError::ContainerNotFound)?;

    if element.tag.is_list_item() {
        if let Some(descriptor) = describe_list_item(tree, container, config) {
            return Ok((container, descriptor));
        }
    }

    let tag = element.tag.as_str().to_string();
    let tag_index = tree
        .elements_by_tag(&tag)
        .iter()
        .position(|&e| e == container)
        .unwrap_or(0);
    Ok((
        container,
        ContainerDescriptor::Element {
            dom_id: element.dom_id.clone(),
            class_name: element.first_class_token().map(str::to_string),
            tag,
            tag_index,
            clean_text: clean_text(tree, container),
        },
    ))
}

fn describe_list_item(
    tree: &DomTree,
    item: NodeId,
    config: &EngineConfig,
) -> Option<ContainerDescriptor> {
    let list = tree.parent_of(item)?;
    let list_el = tree.get_element(list)?;
    if !list_el.tag.is_list() {
        return None;
    }
    let items: Vec<NodeId> = tree
        .children_of(list)
        .iter()
        .copied()
        .filter(|&c| {
            tree.get_element(c)
                .map(|el| el.tag.is_list_item())
                .unwrap_or(false)
        })
        .collect();
    let item_index = items.iter().position(|&i| i == item)?;
    let prefix_of = |id: NodeId| {
        let text = clean_text(tree, id);
        let prefix = truncate_graphemes(&text, config.sibling_prefix_len);
        if prefix.is_empty() {
            None
        } else {
            Some(prefix)
        }
    };
    Some(ContainerDescriptor::ListItem {
        list_tag: list_el.tag.as_str().to_string(),
        item_index,
        clean_text: clean_text(tree, item),
        prev_sibling_prefix: item_index
            .checked_sub(1)
            .and_then(|i| items.get(i))
            .and_then(|&id| prefix_of(id)),
        next_sibling_prefix: items.get(item_index + 1).and_then(|&id| prefix_of(id)),
    })
}

/// Truncate to at most `max` grapheme clusters (avoids slicing inside a
/// combining sequence when prefixes land in the middle of accented text)
pub(crate) fn truncate_graphemes(s: &str, max: usize) -> String {
    s.graphemes(true).take(max).collect()
}
