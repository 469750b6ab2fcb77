//! Streamed delta wire format
//!
//! One event per streamed message, strictly ordered, never batched. The tag
//! makes the delta kind explicit so consumers match exhaustively instead of
//! probing for fields.

use crate::snapshot::ContextPatch;
use serde::{Deserialize, Serialize};

/// One incremental update from the generation step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "content", rename_all = "snake_case")]
pub enum StreamDelta {
    /// A partial context snapshot to merge into the client's context
    ContextDelta(ContextPatch),
    /// A thread title update; touches neither context nor view selection
    ThreadTitle(String),
}
