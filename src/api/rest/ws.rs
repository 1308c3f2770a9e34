use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::claim::ClaimEvent;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Only forward events for this NGO's claims.
    pub ngo: Option<Uuid>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.ngo))
}

pub fn should_forward(event: &ClaimEvent, ngo: Option<Uuid>) -> bool {
    ngo.is_none_or(|ngo_id| event.claim.ngo_id == ngo_id)
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, ngo: Option<Uuid>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.claim_events_tx.subscribe();

    info!(ngo = ?ngo, "claim feed client connected");

    let send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "claim feed client fell behind");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };

            if !should_forward(&event, ngo) {
                continue;
            }

            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize claim event");
                    continue;
                }
            };

            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!(ngo = ?ngo, "claim feed client disconnected");
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::Value;
    use uuid::Uuid;

    use super::should_forward;
    use crate::models::claim::{Claim, ClaimEvent, ClaimEventKind};

    fn event(ngo_seed: u128) -> ClaimEvent {
        ClaimEvent {
            kind: ClaimEventKind::Claimed,
            claim: Claim {
                id: Uuid::new_v4(),
                donation_id: Uuid::new_v4(),
                ngo_id: Uuid::from_u128(ngo_seed),
                priority_score: 56.9,
                claimed_at: Utc::now(),
                verified_at: None,
            },
        }
    }

    #[test]
    fn unfiltered_feed_forwards_everything() {
        assert!(should_forward(&event(1), None));
        assert!(should_forward(&event(2), None));
    }

    #[test]
    fn ngo_filter_drops_other_ngos() {
        let ngo = Some(Uuid::from_u128(1));

        assert!(should_forward(&event(1), ngo));
        assert!(!should_forward(&event(2), ngo));
    }

    #[test]
    fn event_frame_is_tagged() {
        let frame: Value = serde_json::to_value(event(1)).unwrap();

        assert_eq!(frame["kind"], "CLAIMED");
        assert_eq!(frame["claim"]["priorityScore"], 56.9);
        assert!(frame["claim"]["verifiedAt"].is_null());
    }
}
