//! Text anchoring and restoration engine
//!
//! Turns a user selection into a serializable [`Anchor`] that can be
//! relocated in a later, possibly changed, version of the same document and
//! re-wrapped in highlight markers with minimal tree disruption.
//!
//! The pipeline: [`clean_text`] extracts marker-transparent text,
//! [`PositionMap`] bridges whitespace-normalized and raw offsets,
//! [`describe`] fingerprints the containing element, [`TextLocator`]
//! relocates structurally, [`ScoringMatcher`] disambiguates when structure
//! changed, and [`BatchMutator`] applies all wraps in one pass.
//! [`AnchorEngine`] orchestrates; [`RestoreSession`] spreads large restores
//! over multiple steps.

mod anchor;
mod clean_text;
mod config;
mod descriptor;
mod engine;
mod error;
mod events;
mod locator;
mod mutator;
mod position_map;
mod scoring;
mod selection;
mod session;

pub use anchor::{Anchor, AnchorId, AnchorLocation, HighlightColor, PageAnchors};
pub use clean_text::{clean_text, clean_text_with_marker_mask};
pub use config::EngineConfig;
pub use descriptor::{describe, nearest_container, ContainerDescriptor};
pub use engine::{AnchorEngine, AnchorState, RestoreDetail, RestoreReport};
pub use error::{EngineError, Result};
pub use events::{CollectingSink, EngineEvent, EventSink, NullSink};
pub use locator::{LocateError, NodeRange, TextLocator};
pub use mutator::{ApplyOutcome, BatchMutator, MutationPlan};
pub use position_map::{normalize, PositionMap};
pub use scoring::{Candidate, ContextHints, ScanBudget, ScoringMatcher, ScoringWeights};
pub use selection::{Position, TextSelection};
pub use session::{AnchorOp, OpQueue, RestoreSession, SessionStatus};

pub(crate) use locator::resolve_raw_range;
