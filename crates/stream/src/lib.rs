//! Runweave streaming context
//!
//! The generation step emits an ordered stream of delta events while it works:
//! partial context snapshots (`context_delta`) and thread titles
//! (`thread_title`). This crate owns the wire types for those deltas and the
//! single-threaded reducer that folds them into a consistent client-side view
//! state.
//!
//! The reducer is the sole owner of the context snapshot: nothing else writes
//! to it, and every other component sees read-only snapshots.

pub mod delta;
pub mod reducer;
pub mod snapshot;

pub use delta::StreamDelta;
pub use reducer::{reduce_all, ActiveView, ViewState};
pub use snapshot::{ContextPatch, ContextSnapshot, ResearchTopic, RunbookSection, SavedArtifact};
