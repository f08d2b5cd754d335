//! DOM Model - Owned document tree for the highlight anchoring engine
//!
//! This crate provides the tree adapter the anchoring engine works against:
//! elements, text nodes, and highlight markers with stable UUID node IDs,
//! plus the split/wrap/unwrap primitives needed to apply highlights without
//! losing text.

mod node_id;
mod node;
mod tag;
mod element;
mod text;
mod marker;
mod tree;
mod builder;
mod error;

pub use node_id::*;
pub use node::*;
pub use tag::*;
pub use element::*;
pub use text::*;
pub use marker::*;
pub use tree::*;
pub use builder::*;
pub use error::*;
