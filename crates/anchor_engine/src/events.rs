//! Engine event seam
//!
//! Hosts observe successful operations through an `EventSink`. The engine
//! emits after the tree and anchor set are already consistent; sinks must
//! not call back into the engine.

use crate::{Anchor, AnchorId, HighlightColor};
use std::cell::RefCell;
use std::rc::Rc;

/// Notification of a completed engine operation
#[derive(Debug, Clone)]
pub enum EngineEvent {
    Created(Anchor),
    Deleted(AnchorId),
    Recolored { id: AnchorId, color: HighlightColor },
    Restored { resolved: usize, stale: usize },
}

/// Observer of engine operations
pub trait EventSink {
    fn emit(&mut self, event: EngineEvent);
}

/// Discards every event
#[derive(Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: EngineEvent) {}
}

/// Collects events in order, for tests. Clones share the same buffer so a
/// handle kept outside the engine can inspect what was emitted.
#[derive(Debug, Default, Clone)]
pub struct CollectingSink {
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events emitted so far
    pub fn events(&self) -> Vec<EngineEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}

impl EventSink for CollectingSink {
    fn emit(&mut self, event: EngineEvent) {
        self.events.borrow_mut().push(event);
    }
}
