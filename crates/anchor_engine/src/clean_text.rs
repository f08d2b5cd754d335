//! Clean-text extraction - subtree text with highlight markers removed
//!
//! Markers wrap existing text nodes without changing their content, so the
//! clean text of a subtree is the document-order concatenation of all
//! descendant text nodes with marker wrappers treated as transparent. The
//! walk is read-only: no throwaway tree copies, no side effects.

use dom_model::{DomTree, NodeId, NodeKind};

/// Text content of a subtree as if every highlight marker were unwrapped.
/// Deterministic and idempotent for a given tree state.
pub fn clean_text(tree: &DomTree, node: NodeId) -> String {
    let mut result = String::new();
    collect(tree, node, &mut |text, _| result.push_str(text));
    result
}

/// Clean text plus a per-character mask marking which characters currently
/// sit inside a highlight marker. Used by the scoring matcher to skip
/// occurrences that are already highlighted.
pub fn clean_text_with_marker_mask(tree: &DomTree, node: NodeId) -> (String, Vec<bool>) {
    let mut text = String::new();
    let mut mask = Vec::new();
    collect(tree, node, &mut |chunk, in_marker| {
        text.push_str(chunk);
        mask.extend(std::iter::repeat(in_marker).take(chunk.chars().count()));
    });
    (text, mask)
}

fn collect(tree: &DomTree, node: NodeId, emit: &mut impl FnMut(&str, bool)) {
    walk(tree, node, false, emit);
}

fn walk(tree: &DomTree, node: NodeId, in_marker: bool, emit: &mut impl FnMut(&str, bool)) {
    match tree.node_kind(node) {
        Some(NodeKind::Text) => {
            if let Some(text) = tree.get_text(node) {
                emit(&text.text, in_marker);
            }
        }
        Some(NodeKind::Marker) => {
            for &child in tree.children_of(node) {
                walk(tree, child, true, emit);
            }
        }
        Some(NodeKind::Element) => {
            for &child in tree.children_of(node) {
                walk(tree, child, in_marker, emit);
            }
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_model::{DomTree, Element, TextNode};

    #[test]
    fn test_markers_are_transparent() {
        let mut tree = DomTree::new();
        let para = tree
            .insert_element(Element::new("p"), tree.root_id(), None)
            .unwrap();
        let text = tree
            .insert_text(TextNode::new("cat dog fish"), para, None)
            .unwrap();

        let before = clean_text(&tree, para);
        assert_eq!(before, "cat dog fish");

        // Wrap "dog" in a marker: split twice, then wrap the middle node.
        let (_, mid) = tree.split_text_node(text, 4).unwrap();
        let (mid, _) = tree.split_text_node(mid, 3).unwrap();
        tree.wrap_text_node_in_marker(mid, "a1", "yellow").unwrap();

        assert_eq!(clean_text(&tree, para), before);
        // Idempotent on an unchanged tree.
        assert_eq!(clean_text(&tree, para), before);
    }

    #[test]
    fn test_marker_mask() {
        let mut tree = DomTree::new();
        let para = tree
            .insert_element(Element::new("p"), tree.root_id(), None)
            .unwrap();
        let text = tree.insert_text(TextNode::new("abcdef"), para, None).unwrap();
        let (_, mid) = tree.split_text_node(text, 2).unwrap();
        let (mid, _) = tree.split_text_node(mid, 2).unwrap();
        tree.wrap_text_node_in_marker(mid, "a1", "green").unwrap();

        let (clean, mask) = clean_text_with_marker_mask(&tree, para);
        assert_eq!(clean, "abcdef");
        assert_eq!(mask, vec![false, false, true, true, false, false]);
    }
}
