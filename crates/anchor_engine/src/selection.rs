//! Selection model - positions inside text nodes and text selections

use dom_model::{DomTree, NodeId};
use serde::{Deserialize, Serialize};

/// A position inside a text node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// The text node containing this position
    pub node: NodeId,
    /// Character offset within the node
    pub offset: usize,
}

impl Position {
    /// Create a new position
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A selection over raw text, bounded by two positions in text nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSelection {
    /// Where the selection starts
    pub start: Position,
    /// Where the selection ends
    pub end: Position,
}

impl TextSelection {
    /// Create a new selection
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Check whether the selection is collapsed (no characters covered)
    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    /// Return a copy ordered so that `start` precedes `end` in document
    /// order. Returns `None` if either endpoint is not a text node in the
    /// given tree.
    pub fn normalized(&self, tree: &DomTree) -> Option<TextSelection> {
        let order = tree.text_nodes_in(tree.root_id());
        let start_idx = order.iter().position(|&n| n == self.start.node)?;
        let end_idx = order.iter().position(|&n| n == self.end.node)?;
        let backwards = end_idx < start_idx
            || (end_idx == start_idx && self.end.offset < self.start.offset);
        if backwards {
            Some(TextSelection::new(self.end, self.start))
        } else {
            Some(*self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dom_model::TreeBuilder;

    #[test]
    fn test_normalization_flips_backwards_selection() {
        let mut builder = TreeBuilder::new();
        builder.element("p", |p| {
            p.text("abc");
        })
        .unwrap();
        builder.element("p", |p| {
            p.text("def");
        })
        .unwrap();
        let tree = builder.finish();
        let texts = tree.text_nodes_in(tree.root_id());

        let forward = TextSelection::new(Position::new(texts[0], 1), Position::new(texts[1], 2));
        assert_eq!(forward.normalized(&tree), Some(forward));

        let backwards = TextSelection::new(Position::new(texts[1], 2), Position::new(texts[0], 1));
        assert_eq!(backwards.normalized(&tree), Some(forward));

        let same_node = TextSelection::new(Position::new(texts[0], 3), Position::new(texts[0], 1));
        let flipped = same_node.normalized(&tree).unwrap();
        assert_eq!(flipped.start.offset, 1);
        assert_eq!(flipped.end.offset, 3);
    }

    #[test]
    fn test_collapsed() {
        let node = NodeId::new();
        let sel = TextSelection::new(Position::new(node, 4), Position::new(node, 4));
        assert!(sel.is_collapsed());
    }
}
