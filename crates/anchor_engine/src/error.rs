//! Error types for anchoring operations

use dom_model::DomError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Selection is empty or collapsed")]
    EmptySelection,

    #[error("Container could not be located in the current tree")]
    ContainerNotFound,

    #[error("Structural mutation failed: {0}")]
    StructuralMutation(String),

    #[error("DOM error: {0}")]
    Dom(#[from] DomError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
