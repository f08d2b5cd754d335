//! Fluent tree construction for tests and demos

use crate::{DomTree, Element, NodeId, Result, TextNode};

/// Builder for assembling a [`DomTree`] declaratively.
///
/// ```
/// use dom_model::TreeBuilder;
///
/// let mut builder = TreeBuilder::new();
/// builder
///     .element("p", |p| {
///         p.dom_id("intro").text("Hello world");
///     })
///     .unwrap();
/// let tree = builder.finish();
/// assert_eq!(tree.raw_text(tree.root_id()), "Hello world");
/// ```
pub struct TreeBuilder {
    tree: DomTree,
}

impl TreeBuilder {
    /// Start building a new tree
    pub fn new() -> Self {
        Self { tree: DomTree::new() }
    }

    /// Add an element under the root and configure it through the closure
    pub fn element(
        &mut self,
        tag: &str,
        build: impl FnOnce(&mut ElementBuilder<'_>),
    ) -> Result<NodeId> {
        let root = self.tree.root_id();
        build_element(&mut self.tree, root, tag, build)
    }

    /// Finish and return the tree
    pub fn finish(self) -> DomTree {
        self.tree
    }
}

impl Default for TreeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped builder for one element's attributes and children
pub struct ElementBuilder<'a> {
    tree: &'a mut DomTree,
    id: NodeId,
    error: Option<crate::DomError>,
}

impl ElementBuilder<'_> {
    /// Set the `id` attribute
    pub fn dom_id(&mut self, dom_id: &str) -> &mut Self {
        if let Some(el) = self.tree.get_element_mut(self.id) {
            el.set_dom_id(Some(dom_id.to_string()));
        }
        self
    }

    /// Set the `class` attribute
    pub fn class(&mut self, class_name: &str) -> &mut Self {
        if let Some(el) = self.tree.get_element_mut(self.id) {
            el.set_class_name(Some(class_name.to_string()));
        }
        self
    }

    /// Append a text node child
    pub fn text(&mut self, text: impl Into<String>) -> &mut Self {
        if self.error.is_none() {
            if let Err(e) = self.tree.insert_text(TextNode::new(text), self.id, None) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Append a child element and configure it through the closure
    pub fn child(&mut self, tag: &str, build: impl FnOnce(&mut ElementBuilder<'_>)) -> &mut Self {
        if self.error.is_none() {
            if let Err(e) = build_element(self.tree, self.id, tag, build) {
                self.error = Some(e);
            }
        }
        self
    }
}

fn build_element(
    tree: &mut DomTree,
    parent: NodeId,
    tag: &str,
    build: impl FnOnce(&mut ElementBuilder<'_>),
) -> Result<NodeId> {
    let id = tree.insert_element(Element::new(tag), parent, None)?;
    let mut builder = ElementBuilder { tree, id, error: None };
    build(&mut builder);
    match builder.error.take() {
        Some(e) => Err(e),
        None => Ok(id),
    }
}
