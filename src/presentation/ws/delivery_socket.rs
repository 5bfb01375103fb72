use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::http::{HeaderMap, StatusCode, header::ORIGIN};
use axum::response::{IntoResponse, Response};
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use crate::bootstrap::app_context::AppContext;
use crate::bootstrap::config::AllowedOrigins;
use crate::domain::delivery::DeliveryEvent;
use crate::infrastructure::realtime::{DeliverySocketHandler, DeliverySubscription};

pub const DELIVERY_SOCKET_PATH: &str = "/ws/delivery";

#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ClientMessage {
    TrackOrder {
        #[serde(rename = "orderId")]
        order_id: String,
    },
    UntrackOrder {
        #[serde(rename = "orderId")]
        order_id: String,
    },
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(tag = "event", rename_all = "kebab-case")]
pub enum ServerMessage {
    Tracking {
        #[serde(rename = "orderId")]
        order_id: String,
    },
    Untracked {
        #[serde(rename = "orderId")]
        order_id: String,
    },
    DeliveryStatus(DeliveryEvent),
    Error {
        message: String,
    },
}

/// Browsers always send `Origin` on a WebSocket handshake; other clients may
/// omit it and are let through.
pub fn origin_allowed(origins: &AllowedOrigins, headers: &HeaderMap) -> bool {
    match headers.get(ORIGIN) {
        None => true,
        Some(value) => value.to_str().map(|o| origins.contains(o)).unwrap_or(false),
    }
}

#[utoipa::path(
    get,
    path = "/ws/delivery",
    responses(
        (status = 101, description = "Switching Protocols (WebSocket upgrade)"),
        (status = 403, description = "Origin not allowed")
    ),
    tag = "Delivery"
)]
pub async fn delivery_socket_entry(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    // Origin is checked before the handshake so a foreign page always sees 403.
    if !origin_allowed(&ctx.cfg.allowed_origins, &headers) {
        tracing::warn!(origin = ?headers.get(ORIGIN), "delivery_socket_origin_rejected");
        return StatusCode::FORBIDDEN.into_response();
    }
    match ws {
        Ok(ws) => {
            let handler = ctx.delivery_socket();
            ws.on_upgrade(move |socket| peer(socket, handler))
        }
        Err(rejection) => rejection.into_response(),
    }
}

pub fn handle_client_message(sub: &mut DeliverySubscription, text: &str) -> ServerMessage {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(ClientMessage::TrackOrder { order_id }) => {
            sub.track(&order_id);
            ServerMessage::Tracking { order_id }
        }
        Ok(ClientMessage::UntrackOrder { order_id }) => {
            sub.untrack(&order_id);
            ServerMessage::Untracked { order_id }
        }
        Err(e) => ServerMessage::Error {
            message: format!("unrecognised message: {e}"),
        },
    }
}

async fn send(sink: &mut SplitSink<WebSocket, Message>, msg: &ServerMessage) -> anyhow::Result<()> {
    let text = serde_json::to_string(msg)?;
    sink.send(Message::Text(text)).await?;
    Ok(())
}

enum Step {
    Incoming(Option<Result<Message, axum::Error>>),
    Event(Option<DeliveryEvent>),
}

async fn peer(socket: WebSocket, handler: Arc<DeliverySocketHandler>) {
    let mut sub = handler.subscribe();
    let id = sub.id();
    tracing::debug!(connection = %id, connected = handler.connected(), "delivery_socket_connected");
    let (mut sink, mut stream) = socket.split();

    loop {
        let step = tokio::select! {
            msg = stream.next() => Step::Incoming(msg),
            ev = sub.next() => Step::Event(ev),
        };
        let outgoing = match step {
            Step::Incoming(Some(Ok(Message::Text(text)))) => handle_client_message(&mut sub, &text),
            Step::Incoming(Some(Ok(Message::Close(_)))) | Step::Incoming(None) => break,
            Step::Incoming(Some(Ok(_))) => continue,
            Step::Incoming(Some(Err(e))) => {
                tracing::debug!(connection = %id, error = %e, "delivery_socket_read_failed");
                break;
            }
            Step::Event(Some(event)) => ServerMessage::DeliveryStatus(event),
            Step::Event(None) => break,
        };
        if let Err(e) = send(&mut sink, &outgoing).await {
            tracing::debug!(connection = %id, error = %e, "delivery_socket_write_failed");
            break;
        }
    }

    tracing::info!(connection = %id, "delivery_socket_closed");
}
