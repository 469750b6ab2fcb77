//! Delta stream replay handler
//!
//! Clients reopening a thread can ask the server to fold the persisted delta
//! stream into the view state they should resume from, instead of replaying
//! it locally. Deltas are applied in request order, one at a time.

use axum::Json;
use runweave_common::errors::Result;
use runweave_stream::{reduce_all, StreamDelta, ViewState};
use serde::{Deserialize, Serialize};

/// Replay request: the ordered delta stream of one thread
#[derive(Debug, Deserialize)]
pub struct ReplayRequest {
    pub deltas: Vec<StreamDelta>,
}

/// Replay response
#[derive(Serialize)]
pub struct ReplayResponse {
    pub view_state: ViewState,
}

/// Fold an ordered delta stream into its final view state
pub async fn replay(Json(request): Json<ReplayRequest>) -> Result<Json<ReplayResponse>> {
    let view_state = reduce_all(request.deltas);
    Ok(Json(ReplayResponse { view_state }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use runweave_stream::ActiveView;

    #[tokio::test]
    async fn test_replay_reduces_in_order() {
        let deltas: Vec<StreamDelta> = vec![
            serde_json::from_value(serde_json::json!({
                "type": "context_delta",
                "content": {"saved_artifacts": {"topic": [{
                    "artifact_id": "a", "url": "u", "title": "t", "summary": "s"
                }]}}
            }))
            .unwrap(),
            serde_json::from_value(serde_json::json!({
                "type": "thread_title",
                "content": "Resumed thread"
            }))
            .unwrap(),
        ];

        let Json(response) = replay(Json(ReplayRequest { deltas })).await.unwrap();
        assert_eq!(response.view_state.active_view, ActiveView::Artifacts);
        assert!(response.view_state.is_visible);
        assert_eq!(response.view_state.title, "Resumed thread");
    }
}
