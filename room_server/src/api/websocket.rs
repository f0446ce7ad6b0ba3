//! WebSocket handler for live room play.
//!
//! # Connection Flow
//!
//! 1. Client connects via `GET /ws/{room_id}` with an `access_token` cookie
//!    or a `?token=` query parameter
//! 2. Server verifies the token; failures get `401` and no upgrade
//! 3. The connection attaches to the room, creating it if needed
//! 4. One loop forwards room pushes out and client frames in
//! 5. On disconnect the session detaches, releasing the seat
//!
//! # Example
//!
//! ```javascript
//! const ws = new WebSocket('ws://localhost:6969/ws/lobby?token=eyJhbGc...');
//!
//! ws.onmessage = (event) => {
//!   const data = JSON.parse(event.data);
//!   switch (data.type) {
//!     case 'update': render(data.state); break;
//!     case 'error': toast(data.message); break;
//!   }
//! };
//!
//! ws.send(JSON.stringify({ action: 'join', chips: 1000 }));
//! ws.send(JSON.stringify({ action: 'move', move: 'raise', amount: 300 }));
//! ```

use axum::{
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use futures_util::{
    SinkExt, StreamExt,
    stream::SplitSink,
};
use log::{debug, error, info, warn};
use poker_room::{
    auth::{Credentials, Identity},
    net::{ClientMessage, GatewayError, ServerMessage, Session},
};
use serde::Deserialize;
use std::{sync::atomic::Ordering, time::Instant};

use super::{
    AppState,
    rate_limiter::{ConnectionLimiter, Throttle},
};
use crate::{
    logging::{log_performance, log_security_event},
    metrics,
};

/// Cookie carrying the access token for browser clients.
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

/// Verify the caller and upgrade to a WebSocket bound to `room_id`.
///
/// # Response
///
/// On success, upgrades connection to WebSocket protocol (101 Switching Protocols).
/// On authentication failure, returns `401 Unauthorized`.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    let credentials = Credentials {
        token: cookie_token(&headers).or(query.token),
    };

    let identity = match state.authenticator.authenticate(&credentials).await {
        Ok(identity) => identity,
        Err(e) => {
            metrics::auth_failures_total();
            log_security_event("auth_rejected", None, Some(&room_id), &e.to_string());
            return (StatusCode::UNAUTHORIZED, e.client_message()).into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, room_id, identity, state))
}

/// Pull the access token out of the `Cookie` headers.
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, token)| token.to_string())
        .filter(|token| !token.is_empty())
}

/// Handle an established WebSocket connection.
///
/// Room pushes and client frames share one `select!` loop, so a slow
/// client socket only ever backs up this connection's own queue.
async fn handle_socket(socket: WebSocket, room_id: String, identity: Identity, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    let user_id = identity.user_id.clone();
    let (mut session, mut outbound) =
        match Session::open(state.registry.clone(), &room_id, identity).await {
            Ok(opened) => opened,
            Err(e) => {
                error!("Could not attach user {} to room {}: {}", user_id, room_id, e);
                let _ = send_message(&mut sender, &ServerMessage::error(e.client_message())).await;
                let _ = sender.send(Message::Close(None)).await;
                return;
            }
        };

    let active = state.connections.fetch_add(1, Ordering::Relaxed) + 1;
    metrics::websocket_connections_total();
    metrics::websocket_connections_active(active as u64);
    metrics::rooms_active(state.registry.room_count().await);
    info!(
        "WebSocket connected: room={}, user={}, connection={}",
        room_id,
        user_id,
        session.connection()
    );

    let mut limiter = ConnectionLimiter::new(state.limits);

    loop {
        tokio::select! {
            pushed = outbound.recv() => match pushed {
                Some(message) => {
                    if send_message(&mut sender, &message).await.is_err() {
                        break;
                    }
                }
                None => {
                    // The room let go of this connection for falling behind.
                    warn!("Connection {} dropped by room {}", session.connection(), room_id);
                    metrics::slow_consumers_total();
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            },
            inbound = receiver.next() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    let reply = dispatch(&mut session, &mut limiter, text.as_str()).await;
                    if let Some(reply) = reply
                        && send_message(&mut sender, &reply).await.is_err()
                    {
                        break;
                    }
                }
                Some(Ok(Message::Binary(_))) => {
                    let e = GatewayError::Protocol("binary frames are not supported".to_string());
                    metrics::messages_rejected_total(e.reason());
                    if send_message(&mut sender, &session.reject(&e)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    info!("WebSocket closed: room={}, user={}", room_id, user_id);
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!("WebSocket error for user {}: {}", user_id, e);
                    break;
                }
            },
        }
    }

    session.close().await;

    let active = state.connections.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
    metrics::websocket_connections_active(active as u64);
    metrics::rooms_active(state.registry.room_count().await);
    info!("WebSocket disconnected: room={}, user={}", room_id, user_id);
}

/// Rate-limit, parse and run one inbound frame. Returns the error reply,
/// if any; successful requests are answered through room pushes.
async fn dispatch(
    session: &mut Session,
    limiter: &mut ConnectionLimiter,
    text: &str,
) -> Option<ServerMessage> {
    if let Err(throttle) = limiter.check() {
        let window = match throttle {
            Throttle::Burst => "Burst",
            Throttle::Sustained => "Sustained",
        };
        warn!(
            "{} rate limit exceeded for user {} (room {}). Blocking message.",
            window,
            session.identity().user_id,
            session.room_id()
        );
        metrics::messages_rejected_total("rate_limited");
        return Some(ServerMessage::error(throttle.message()));
    }

    let message = match ClientMessage::from_json(text) {
        Ok(message) => message,
        Err(e) => {
            metrics::messages_rejected_total(e.reason());
            return Some(session.reject(&e));
        }
    };

    let kind = message.kind();
    let starting = matches!(message, ClientMessage::Start);
    metrics::messages_total(kind);

    let started = Instant::now();
    let result = session.handle(message).await;
    log_performance(
        kind,
        started.elapsed().as_millis() as u64,
        Some(session.room_id()),
    );

    match result {
        Ok(()) => {
            if starting {
                metrics::hands_started_total();
            }
            None
        }
        Err(e) => {
            metrics::messages_rejected_total(e.reason());
            Some(session.reject(&e))
        }
    }
}

async fn send_message(
    sender: &mut SplitSink<WebSocket, Message>,
    message: &ServerMessage,
) -> Result<(), axum::Error> {
    match message.to_json() {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            // Never expected; the message types serialize infallibly.
            error!("Failed to serialize {:?}: {}", message, e);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_token_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; access_token=abc.def.ghi; lang=en"),
        );
        assert_eq!(cookie_token(&headers).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn test_cookie_token_missing_or_empty() {
        let mut headers = HeaderMap::new();
        assert_eq!(cookie_token(&headers), None);

        headers.insert(header::COOKIE, HeaderValue::from_static("access_token="));
        assert_eq!(cookie_token(&headers), None);
    }
}
