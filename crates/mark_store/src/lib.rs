//! Mark store - anchor persistence keyed by page
//!
//! Anchors persist across sessions keyed by a caller-supplied page key.
//! Loading a page that was never saved yields an empty collection, never an
//! error: a page without highlights is the common case, not a failure.

mod error;
mod file;
mod memory;

pub use error::{Result, StoreError};
pub use file::FileStore;
pub use memory::MemoryStore;

use anchor_engine::Anchor;

/// Persistence seam for anchor collections
pub trait AnchorStore {
    /// Load the anchors of a page. Unknown page keys load as empty.
    fn load(&self, page_key: &str) -> Result<Vec<Anchor>>;

    /// Replace the stored anchors of a page
    fn save(&mut self, page_key: &str, anchors: &[Anchor]) -> Result<()>;

    /// Drop every anchor of a page. Removing an unknown key is a no-op.
    fn remove(&mut self, page_key: &str) -> Result<()>;
}
