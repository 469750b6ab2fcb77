//! Streaming context reducer
//!
//! A single-threaded, cooperative state machine: each delta is processed to
//! completion, in the exact order received, before the next is considered. It
//! never blocks and has no internal concurrency. The reducer exclusively owns
//! the context snapshot; incoming patches are the only way it changes.

use crate::delta::StreamDelta;
use crate::snapshot::{patch_sections_content, ContextSnapshot};
use serde::{Deserialize, Serialize};

/// Which result view the client should surface
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActiveView {
    Artifacts,
    Outline,
    Document,
}

/// Client-side view state derived from the delta stream
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    pub active_view: ActiveView,
    pub is_visible: bool,
    pub title: String,
    pub context: ContextSnapshot,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            active_view: ActiveView::Document,
            is_visible: false,
            title: String::new(),
            context: ContextSnapshot::default(),
        }
    }
}

impl ViewState {
    /// Start from a caller-supplied initial context
    pub fn with_context(context: ContextSnapshot) -> Self {
        Self {
            context,
            ..Self::default()
        }
    }

    /// Apply one delta, merging context and re-selecting the active view
    ///
    /// View-selection rules run in fixed priority order, document > outline >
    /// artifacts; the first rule that fires wins and also makes the view
    /// visible. If none fires, view and visibility are unchanged.
    pub fn apply(&mut self, delta: StreamDelta) {
        match delta {
            StreamDelta::ThreadTitle(title) => {
                self.title = title;
            }
            StreamDelta::ContextDelta(patch) => {
                let patch_sections = patch.runbook_sections.clone();
                let patch_artifacts_present = patch
                    .saved_artifacts
                    .as_ref()
                    .is_some_and(|artifacts| !artifacts.is_empty());

                let content_before = self.context.sections_content();
                self.context.merge(patch);

                if let Some(sections) = &patch_sections {
                    if patch_sections_content(sections) != content_before {
                        self.show(ActiveView::Document);
                        return;
                    }
                }
                if patch_sections.is_some_and(|sections| !sections.is_empty()) {
                    self.show(ActiveView::Outline);
                    return;
                }
                if patch_artifacts_present {
                    self.show(ActiveView::Artifacts);
                }
            }
        }
    }

    fn show(&mut self, view: ActiveView) {
        tracing::trace!(view = ?view, "Switching active view");
        self.active_view = view;
        self.is_visible = true;
    }
}

/// Fold an ordered delta stream into its final view state
pub fn reduce_all<I>(deltas: I) -> ViewState
where
    I: IntoIterator<Item = StreamDelta>,
{
    let mut state = ViewState::default();
    for delta in deltas {
        state.apply(delta);
    }
    state
}
