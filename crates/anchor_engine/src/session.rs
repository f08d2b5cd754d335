//! Chunked restore scheduling
//!
//! Restoring a page with many anchors in one pass can stall a host event
//! loop. A `RestoreSession` restores a fixed-size chunk per `step()` call
//! so the host can interleave other work; cancelling abandons the remainder
//! while already-applied markers stay valid. Mutating operations arriving
//! mid-restore are queued per anchor id and drained once that anchor's
//! record exists, so an op can never observe a half-restored anchor.

use crate::{Anchor, AnchorEngine, AnchorId, EngineEvent, HighlightColor, Result, RestoreReport};
use std::collections::{HashMap, VecDeque};

/// A mutating operation deferred until its anchor is available
#[derive(Debug, Clone)]
pub enum AnchorOp {
    Delete,
    Recolor(HighlightColor),
    SetNote(Option<String>),
}

/// Per-anchor-id FIFO of deferred operations.
///
/// The model is single-threaded and cooperative; the queue serializes
/// re-entrant scheduling from chunked sessions, not threads.
#[derive(Debug, Default)]
pub struct OpQueue {
    queues: HashMap<AnchorId, VecDeque<AnchorOp>>,
}

impl OpQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an operation behind any earlier ones for the same anchor
    pub fn enqueue(&mut self, id: AnchorId, op: AnchorOp) {
        self.queues.entry(id).or_default().push_back(op);
    }

    /// Take every queued operation for one anchor, oldest first
    pub fn drain_for(&mut self, id: AnchorId) -> Vec<AnchorOp> {
        self.queues
            .remove(&id)
            .map(|q| q.into_iter().collect())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

/// Progress of a restore session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// More chunks remain
    InProgress { remaining: usize },
    /// All anchors processed or the session was cancelled
    Finished,
}

/// Incremental restore of a page's anchors
pub struct RestoreSession<'a> {
    engine: &'a mut AnchorEngine,
    pending: VecDeque<Anchor>,
    queue: OpQueue,
    report: RestoreReport,
    chunk_size: usize,
    cancelled: bool,
}

impl<'a> RestoreSession<'a> {
    /// Start a session restoring `anchors` in chunks of the engine's
    /// configured size
    pub fn new(engine: &'a mut AnchorEngine, anchors: Vec<Anchor>) -> Self {
        let chunk_size = engine.config().restore_chunk_size.max(1);
        Self {
            engine,
            pending: anchors.into(),
            queue: OpQueue::new(),
            report: RestoreReport::default(),
            chunk_size,
            cancelled: false,
        }
    }

    /// Restore the next chunk, then apply any operations queued for anchors
    /// that now have records
    pub fn step(&mut self) -> Result<SessionStatus> {
        if self.cancelled || self.pending.is_empty() {
            return Ok(SessionStatus::Finished);
        }
        let take = self.chunk_size.min(self.pending.len());
        let chunk: Vec<Anchor> = self.pending.drain(..take).collect();
        let ids: Vec<AnchorId> = chunk.iter().map(|a| a.id).collect();
        let chunk_report = self.engine.restore_chunk(chunk);
        self.report.merge(chunk_report);

        for id in ids {
            for op in self.queue.drain_for(id) {
                self.apply_op(id, op)?;
            }
        }

        if self.pending.is_empty() {
            Ok(SessionStatus::Finished)
        } else {
            Ok(SessionStatus::InProgress {
                remaining: self.pending.len(),
            })
        }
    }

    /// Defer a mutating operation. Applied immediately if the anchor was
    /// already restored (or went stale); otherwise queued until its chunk
    /// completes. Operations for ids this session never restores stay
    /// queued and are dropped at the end.
    pub fn submit(&mut self, id: AnchorId, op: AnchorOp) -> Result<()> {
        if self.engine.anchors().get(id).is_some() {
            self.apply_op(id, op)
        } else {
            self.queue.enqueue(id, op);
            Ok(())
        }
    }

    fn apply_op(&mut self, id: AnchorId, op: AnchorOp) -> Result<()> {
        match op {
            AnchorOp::Delete => {
                self.engine.delete(id)?;
            }
            AnchorOp::Recolor(color) => {
                self.engine.recolor(id, color)?;
            }
            AnchorOp::SetNote(note) => {
                self.engine.set_note(id, note);
            }
        }
        Ok(())
    }

    /// Abandon the unrestored remainder. Markers applied so far stay in the
    /// tree and stay valid.
    pub fn cancel(&mut self) {
        self.cancelled = true;
        self.pending.clear();
    }

    pub fn is_finished(&self) -> bool {
        self.cancelled || self.pending.is_empty()
    }

    /// Number of anchors not yet processed
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    /// Finish the session, emitting the aggregate restore event and
    /// returning the report for the chunks that ran
    pub fn finish(self) -> RestoreReport {
        self.engine.emit(EngineEvent::Restored {
            resolved: self.report.resolved,
            stale: self.report.stale,
        });
        self.report
    }

    /// Drive the session to completion in one call
    pub fn run_to_completion(mut self) -> Result<RestoreReport> {
        while !self.is_finished() {
            self.step()?;
        }
        Ok(self.finish())
    }
}
