//! WebSocket integration tests against a real listener.
//!
//! Each test binds the router to an ephemeral port and talks to it with
//! tokio-tungstenite, using tokens signed with the test secret.

use futures_util::{SinkExt, StreamExt};
use jsonwebtoken::{EncodingKey, Header, encode};
use poker_room::{
    auth::{AccessTokenClaims, JwtAuthenticator},
    room::{RoomConfig, RoomRegistry},
};
use room_server::api::{AppState, create_router, rate_limiter::MessageLimits};
use serde_json::{Value, json};
use std::{
    net::SocketAddr,
    sync::Arc,
    time::{Duration, SystemTime, UNIX_EPOCH},
};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, StatusCode, header},
    },
};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const SECRET: &str = "test_secret_key_for_testing_only_32+";

/// Start a server on an ephemeral port
async fn spawn_server(limits: MessageLimits) -> (SocketAddr, Arc<RoomRegistry>) {
    let registry = Arc::new(RoomRegistry::new(RoomConfig::default()));
    let state = AppState::new(
        registry.clone(),
        Arc::new(JwtAuthenticator::new(SECRET)),
        limits,
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, create_router(state)).await.unwrap();
    });
    (addr, registry)
}

fn token(user_id: &str, username: &str, token_type: &str) -> String {
    let exp = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64 + 3600;
    let claims = AccessTokenClaims {
        sub: user_id.to_string(),
        token_type: token_type.to_string(),
        exp,
        username: Some(username.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn connect(addr: SocketAddr, room: &str, user_id: &str, username: &str) -> Client {
    let url = format!(
        "ws://{}/ws/{}?token={}",
        addr,
        room,
        token(user_id, username, "access")
    );
    let (client, _) = connect_async(url).await.expect("upgrade");
    client
}

async fn send(client: &mut Client, frame: Value) {
    client
        .send(Message::Text(frame.to_string().into()))
        .await
        .unwrap();
}

async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(2), client.next())
            .await
            .expect("frame within timeout")
            .expect("stream open")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

/// Skip frames until one has the given `type`.
async fn recv_type(client: &mut Client, kind: &str) -> Value {
    loop {
        let frame = recv(client).await;
        if frame["type"] == kind {
            return frame;
        }
    }
}

#[tokio::test]
async fn test_invalid_token_is_rejected_before_upgrade() {
    let (addr, registry) = spawn_server(MessageLimits::default()).await;

    for url in [
        format!("ws://{}/ws/lobby", addr),
        format!("ws://{}/ws/lobby?token=not-a-jwt", addr),
        format!(
            "ws://{}/ws/lobby?token={}",
            addr,
            token("1", "alice", "refresh")
        ),
    ] {
        match connect_async(url).await {
            Err(tokio_tungstenite::tungstenite::Error::Http(response)) => {
                assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            }
            other => panic!("expected 401, got {:?}", other.map(|(_, r)| r.status())),
        }
    }
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn test_cookie_token_is_accepted() {
    let (addr, _) = spawn_server(MessageLimits::default()).await;

    let mut request = format!("ws://{}/ws/lobby", addr)
        .into_client_request()
        .unwrap();
    let cookie = format!("access_token={}", token("1", "alice", "access"));
    request
        .headers_mut()
        .insert(header::COOKIE, HeaderValue::from_str(&cookie).unwrap());
    let (mut client, _) = connect_async(request).await.expect("upgrade");

    send(&mut client, json!({"action": "join", "chips": 1500})).await;
    let joined = recv(&mut client).await;
    assert_eq!(joined, json!({"type": "joined", "player_id": 0, "players_count": 1}));
}

#[tokio::test]
async fn test_two_players_play_a_hand() {
    let (addr, registry) = spawn_server(MessageLimits::default()).await;
    let mut alice = connect(addr, "lobby", "1", "alice").await;
    let mut bob = connect(addr, "lobby", "2", "bob").await;

    send(&mut alice, json!({"action": "join"})).await;
    assert_eq!(recv(&mut alice).await["type"], "joined");
    send(&mut bob, json!({"action": "join", "chips": 1000})).await;
    let joined = recv_type(&mut bob, "joined").await;
    assert_eq!(joined["player_id"], 1);
    assert_eq!(joined["players_count"], 2);
    let arrived = recv_type(&mut alice, "player_joined").await;
    assert_eq!(arrived["player_id"], 1);

    send(&mut alice, json!({"action": "start"})).await;
    let alice_view = recv_type(&mut alice, "game_started").await;
    let bob_view = recv_type(&mut bob, "game_started").await;

    let state = &alice_view["state"];
    assert_eq!(state["phase"], "pre_flop");
    assert_eq!(state["hand_number"], 1);
    assert_eq!(state["pot"], 150);
    assert_eq!(state["current_player"], 0);
    assert_eq!(state["min_raise"], 200);
    assert_eq!(state["players"][0]["username"], "alice");
    assert_eq!(state["hole_cards"].as_array().map(Vec::len), Some(2));
    assert_ne!(state["hole_cards"], bob_view["state"]["hole_cards"]);

    // Out of turn
    send(&mut bob, json!({"action": "move", "move": "check"})).await;
    assert_eq!(
        recv_type(&mut bob, "error").await,
        json!({"type": "error", "message": "Not your turn"})
    );

    send(&mut alice, json!({"action": "move", "move": "fold"})).await;
    let complete = recv_type(&mut bob, "hand_complete").await;
    assert_eq!(complete["result"]["winners"], json!([1]));
    assert_eq!(complete["result"]["message"], "Player 1 wins uncontested");
    assert_eq!(complete["result"]["stacks"]["1"], 1050);
    assert_eq!(complete["state"]["active"], false);

    let rooms: Value = {
        let summaries = registry.list_rooms().await;
        serde_json::to_value(summaries).unwrap()
    };
    assert_eq!(rooms[0]["room_id"], "lobby");
    assert_eq!(rooms[0]["hand_number"], 1);
}

#[tokio::test]
async fn test_malformed_messages_get_unicast_errors() {
    let (addr, _) = spawn_server(MessageLimits::default()).await;
    let mut alice = connect(addr, "lobby", "1", "alice").await;
    let mut bob = connect(addr, "lobby", "2", "bob").await;

    alice
        .send(Message::Text("not json".to_string().into()))
        .await
        .unwrap();
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "error", "message": "Invalid message format"})
    );
    send(&mut alice, json!({"action": "shuffle"})).await;
    assert_eq!(recv(&mut alice).await["message"], "Invalid message format");

    // Bob saw none of it; his first frame is alice's later join.
    send(&mut alice, json!({"action": "join"})).await;
    assert_eq!(recv(&mut bob).await["type"], "player_joined");
}

#[tokio::test]
async fn test_rate_limit_rejects_excess_messages() {
    let (addr, _) = spawn_server(MessageLimits {
        burst: 3,
        sustained: 100,
    })
    .await;
    let mut alice = connect(addr, "lobby", "1", "alice").await;

    for _ in 0..4 {
        send(&mut alice, json!({"action": "get_state"})).await;
    }
    // Replies and pushes share the socket, so only the mix is fixed.
    let mut frames = Vec::new();
    for _ in 0..4 {
        frames.push(recv(&mut alice).await);
    }
    assert_eq!(frames.iter().filter(|f| f["type"] == "state").count(), 3);
    assert!(frames.contains(
        &json!({"type": "error", "message": "Rate limit exceeded. Please slow down."})
    ));
}

#[tokio::test]
async fn test_disconnect_releases_seat_and_empties_room() {
    let (addr, registry) = spawn_server(MessageLimits::default()).await;
    let mut alice = connect(addr, "lobby", "1", "alice").await;
    let mut bob = connect(addr, "lobby", "2", "bob").await;

    send(&mut alice, json!({"action": "join"})).await;
    send(&mut bob, json!({"action": "join"})).await;
    recv_type(&mut alice, "player_joined").await;

    bob.close(None).await.unwrap();
    let left = recv_type(&mut alice, "player_left").await;
    assert_eq!(left["players_count"], 1);

    alice.close(None).await.unwrap();
    timeout(Duration::from_secs(2), async {
        while registry.room_count().await > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("room removed after last disconnect");
}
