//! Error types for DOM tree operations

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomError {
    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Node is not a text node: {0}")]
    NotATextNode(Uuid),

    #[error("Node is not a highlight marker: {0}")]
    NotAMarker(Uuid),

    #[error("Invalid offset {offset} in text node {node} of length {len}")]
    InvalidOffset { node: Uuid, offset: usize, len: usize },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

pub type Result<T> = std::result::Result<T, DomError>;
