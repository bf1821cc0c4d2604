//! WebSocket connection state machine.
//!
//! Handles the read/write loop for a single WebSocket connection,
//! dispatching incoming commands and forwarding filtered events.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use super::messages::{WsCommand, WsMessage, WsMessageType};
use super::subscription::{SubscriptionManager, Topic, Topics};
use crate::domain::{EventId, WallEvent};
use crate::store::ControlsStore;

/// Runs the read/write loop for a single WebSocket connection.
///
/// - Reads commands from the client and dispatches them.
/// - Forwards matching events from the [`broadcast::Receiver`] to the client.
///
/// `event_rx` must be opened before any controls snapshot is read so that
/// a write racing a subscribe is delivered at least once. A `display_of`
/// event is followed for controls from the start, and its snapshot is the
/// first frame sent.
pub async fn run_connection(
    socket: WebSocket,
    mut event_rx: broadcast::Receiver<WallEvent>,
    controls: Arc<dyn ControlsStore>,
    display_of: Option<EventId>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut subs = SubscriptionManager::new();

    if let Some(event_id) = display_of {
        subs.subscribe(&[event_id], false, Topics::from_request(&[Topic::Controls]));
        let snapshot = match controls.get(event_id).await {
            Ok(current) => WsMessage::event(controls_snapshot(event_id, &current)),
            Err(e) => WsMessage::error("", 500, &e.to_string()),
        };
        if let Some(json) = snapshot.to_json()
            && ws_tx.send(Message::text(json)).await.is_err()
        {
            return;
        }
    }

    'conn: loop {
        tokio::select! {
            // Incoming message from client
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let replies = handle_text_message(&text, &mut subs, controls.as_ref()).await;
                        for reply in replies.iter().filter_map(WsMessage::to_json) {
                            if ws_tx.send(Message::text(reply)).await.is_err() {
                                break 'conn;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
            // Event from EventBus
            event = event_rx.recv() => {
                match event {
                    Ok(wall_event) => {
                        if !subs.matches(&wall_event) {
                            continue;
                        }
                        let payload = serde_json::to_value(&wall_event).unwrap_or_default();
                        let Some(json) = WsMessage::event(payload).to_json() else {
                            continue;
                        };
                        if ws_tx.send(Message::text(json)).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(lagged = n, "ws client lagged behind event bus");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    tracing::debug!("ws connection closed");
}

/// Splits raw id strings into parsed ids and the wildcard flag. Unparseable
/// ids are skipped.
fn parse_event_ids(raw: &[String]) -> (Vec<EventId>, bool) {
    let wildcard = raw.iter().any(|s| s == "*");
    let ids = raw
        .iter()
        .filter(|s| s.as_str() != "*")
        .filter_map(|s| s.parse::<EventId>().ok())
        .collect();
    (ids, wildcard)
}

fn controls_snapshot(
    event_id: EventId,
    controls: &crate::domain::Controls,
) -> serde_json::Value {
    serde_json::json!({
        "event_type": "controls_snapshot",
        "event_id": event_id,
        "controls": controls,
    })
}

/// Handles a text message from the client, returning the replies to send
/// in order.
async fn handle_text_message(
    text: &str,
    subs: &mut SubscriptionManager,
    controls: &dyn ControlsStore,
) -> Vec<WsMessage> {
    let Ok(msg) = serde_json::from_str::<WsMessage>(text) else {
        return vec![WsMessage::error("", 400, "malformed JSON")];
    };
    let Ok(command) = serde_json::from_value::<WsCommand>(msg.payload) else {
        return vec![WsMessage::error(msg.id, 404, "unknown command")];
    };

    match command {
        WsCommand::Subscribe { event_ids, topics } => {
            let (ids, wildcard) = parse_event_ids(&event_ids);
            let topics = Topics::from_request(&topics);
            subs.subscribe(&ids, wildcard, topics);
            let mut replies = vec![WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "subscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "topics": topics.to_vec(),
                    "count": subs.count(),
                    "wildcard": subs.is_subscribed_all(),
                }),
            )];
            if !topics.contains(Topic::Controls) {
                return replies;
            }
            for event_id in ids {
                match controls.get(event_id).await {
                    Ok(current) => {
                        replies.push(WsMessage::event(controls_snapshot(event_id, &current)));
                    }
                    Err(e) => {
                        tracing::warn!(%event_id, error = %e, "failed to read controls snapshot");
                    }
                }
            }
            replies
        }
        WsCommand::Unsubscribe { event_ids } => {
            let (ids, wildcard) = parse_event_ids(&event_ids);
            subs.unsubscribe(&ids, wildcard);
            vec![WsMessage::new(
                msg.id,
                WsMessageType::Response,
                serde_json::json!({
                    "unsubscribed": ids.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "remaining_count": subs.count(),
                }),
            )]
        }
        WsCommand::GetControls { event_id } => {
            let Ok(event_id) = event_id.parse::<EventId>() else {
                return vec![WsMessage::error(msg.id, 400, "invalid event id")];
            };
            match controls.get(event_id).await {
                Ok(current) => vec![WsMessage::new(
                    msg.id,
                    WsMessageType::Response,
                    controls_snapshot(event_id, &current),
                )],
                Err(e) => vec![WsMessage::error(msg.id, 500, &e.to_string())],
            }
        }
    }
}
