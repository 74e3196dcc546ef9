//! End-to-end tests over a real WebSocket: a server on an ephemeral port
//! and `tokio-tungstenite` clients speaking the JSON wire format.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use raceline::RacelineServer;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server() -> SocketAddr {
    let server = RacelineServer::builder()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("bind server");
    let addr = server.local_addr().expect("local addr");
    tokio::spawn(server.run());
    addr
}

/// Connects a client and swallows the `connected` greeting.
async fn connect(addr: SocketAddr) -> Client {
    let (mut ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("connect");
    let greeting = next_event(&mut ws).await;
    assert_eq!(greeting["type"], "connected");
    ws
}

async fn send(ws: &mut Client, event: Value) {
    ws.send(Message::Text(event.to_string().into()))
        .await
        .expect("send frame");
}

async fn next_event(ws: &mut Client) -> Value {
    loop {
        let msg = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).expect("frame is JSON");
        }
    }
}

#[tokio::test]
async fn test_connect_greets_with_id_and_server_time() {
    let addr = start_server().await;
    let (mut ws, _) = connect_async(format!("ws://{addr}"))
        .await
        .expect("connect");

    let greeting = next_event(&mut ws).await;
    assert_eq!(greeting["type"], "connected");
    assert!(greeting["connectionId"].is_u64());
    assert!(greeting["serverTime"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_create_and_join_room_end_to_end() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "type": "create-room", "name": "Alice" })).await;
    let created = next_event(&mut alice).await;
    assert_eq!(created["type"], "room-created");
    assert_eq!(created["isHost"], true);
    let code = created["roomCode"].as_str().expect("room code");
    assert_eq!(code.len(), 6);
    assert!(code
        .chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));

    send(
        &mut bob,
        json!({ "type": "join-room", "roomCode": code, "name": "Bob" }),
    )
    .await;

    let joined = next_event(&mut bob).await;
    assert_eq!(joined["type"], "joined-room");
    assert_eq!(joined["roomCode"], code);
    assert_eq!(joined["isHost"], false);
    assert_eq!(joined["players"].as_array().unwrap().len(), 2);
    assert_eq!(joined["players"][0]["name"], "Alice");

    let update = next_event(&mut bob).await;
    assert_eq!(update["type"], "room-update");
    assert_eq!(update["playerCount"], 2);

    let arrival = next_event(&mut alice).await;
    assert_eq!(arrival["type"], "player-joined");
    assert_eq!(arrival["playerName"], "Bob");
    let update = next_event(&mut alice).await;
    assert_eq!(update["type"], "room-update");
}

#[tokio::test]
async fn test_position_relay_skips_sender() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "type": "create-room", "name": "Alice" })).await;
    let created = next_event(&mut alice).await;
    let code = created["roomCode"].as_str().unwrap().to_string();

    send(
        &mut bob,
        json!({ "type": "join-room", "roomCode": code, "name": "Bob" }),
    )
    .await;
    next_event(&mut bob).await; // joined-room
    next_event(&mut bob).await; // room-update
    next_event(&mut alice).await; // player-joined
    next_event(&mut alice).await; // room-update

    send(
        &mut alice,
        json!({
            "type": "update-position",
            "position": { "x": 1.5, "y": 0.0, "z": -2.0 },
            "lap": 1,
            "progress": 0.25
        }),
    )
    .await;

    let relayed = next_event(&mut bob).await;
    assert_eq!(relayed["type"], "player-update");
    assert_eq!(relayed["lap"], 1);
    assert_eq!(relayed["position"]["x"], 1.5);

    // Ordering probe: if the relay had been echoed to Alice it would
    // arrive before the pong.
    send(&mut alice, json!({ "type": "ping" })).await;
    let next = next_event(&mut alice).await;
    assert_eq!(next["type"], "pong");
}

#[tokio::test]
async fn test_join_with_bad_code_gets_error_event() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    send(
        &mut ws,
        json!({ "type": "join-room", "roomCode": "NOSUCH" }),
    )
    .await;

    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "error");
    assert!(event["message"]
        .as_str()
        .unwrap()
        .contains("not found"));
}

#[tokio::test]
async fn test_malformed_frames_do_not_kill_the_connection() {
    let addr = start_server().await;
    let mut ws = connect(addr).await;

    send(&mut ws, json!({ "type": "fly-to-moon" })).await;
    ws.send(Message::Text("not json".to_string().into()))
        .await
        .expect("send garbage");

    // The connection still works afterwards.
    send(&mut ws, json!({ "type": "ping" })).await;
    let event = next_event(&mut ws).await;
    assert_eq!(event["type"], "pong");
}

#[tokio::test]
async fn test_disconnect_notifies_room_members() {
    let addr = start_server().await;
    let mut alice = connect(addr).await;
    let mut bob = connect(addr).await;

    send(&mut alice, json!({ "type": "create-room", "name": "Alice" })).await;
    let created = next_event(&mut alice).await;
    let code = created["roomCode"].as_str().unwrap().to_string();

    send(
        &mut bob,
        json!({ "type": "join-room", "roomCode": code, "name": "Bob" }),
    )
    .await;
    next_event(&mut bob).await; // joined-room
    next_event(&mut bob).await; // room-update
    next_event(&mut alice).await; // player-joined
    next_event(&mut alice).await; // room-update

    drop(bob);

    let left = next_event(&mut alice).await;
    assert_eq!(left["type"], "player-left");
    assert_eq!(left["playerName"], "Bob");
    let update = next_event(&mut alice).await;
    assert_eq!(update["type"], "room-update");
    assert_eq!(update["playerCount"], 1);
}
