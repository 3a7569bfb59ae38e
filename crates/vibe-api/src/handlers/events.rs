//! Live match events over WebSocket
//!
//! The socket carries every event addressed to the caller as a JSON text
//! frame: pairing created, consent recorded, unlocked, abandoned, earn-back
//! offers. Client frames other than close are ignored.

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use vibe_core::{EventFilter, EventStream, UserId};

use crate::extractors::AuthUser;
use crate::response::ApiResult;
use crate::state::AppState;

/// Keeps intermediaries from closing an idle socket
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// GET /match/events
pub async fn match_events(
    State(state): State<AppState>,
    auth: AuthUser,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    // Subscribe before upgrading so a transport failure is still an HTTP error
    let events = state
        .match_context()
        .events()
        .subscribe(EventFilter::User(auth.user_id))
        .await?;

    let user_id = auth.user_id;
    Ok(ws.on_upgrade(move |socket| stream_events(socket, user_id, events)))
}

async fn stream_events(socket: WebSocket, user_id: UserId, mut events: EventStream) {
    info!(user_id = %user_id, "Event socket opened");

    let (mut sink, mut incoming) = socket.split();

    let mut heartbeat = interval(PING_INTERVAL);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    debug!(user_id = %user_id, "Event stream ended");
                    break;
                };
                match serde_json::to_string(&event) {
                    Ok(json) => {
                        if sink.send(Message::Text(json)).await.is_err() {
                            debug!(user_id = %user_id, "Client went away mid-send");
                            break;
                        }
                    }
                    Err(e) => warn!(user_id = %user_id, error = %e, "Failed to encode event"),
                }
            }
            frame = incoming.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(user_id = %user_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = heartbeat.tick() => {
                if sink.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
    info!(user_id = %user_id, "Event socket closed");
}
