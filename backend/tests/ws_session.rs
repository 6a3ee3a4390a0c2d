// End-to-end tests: a real server on a loopback port, driven by WebSocket
// clients.

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use land_backend::api;
use land_backend::engine::directory::RoomDirectory;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server(directory: RoomDirectory) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, api::router(directory)).await.unwrap();
    });
    addr
}

async fn connect(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws")).await.unwrap();
    ws
}

async fn send(ws: &mut Client, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

/// Read frames until a JSON message of type `kind` arrives.
async fn next_of_type(ws: &mut Client, kind: &str) -> Value {
    let wait = async {
        loop {
            let frame = ws.next().await.expect("stream ended").unwrap();
            if let Message::Text(text) = frame {
                let value: Value = serde_json::from_str(text.as_str()).unwrap();
                if value["type"] == kind {
                    return value;
                }
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(5), wait)
        .await
        .unwrap_or_else(|_| panic!("no {kind} message within 5s"))
}

async fn wait_until_empty(directory: &RoomDirectory) {
    for _ in 0..100 {
        if directory.is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("directory still holds {} rooms", directory.len());
}

#[tokio::test]
async fn test_connect_receives_initial_snapshot() {
    let directory = RoomDirectory::new();
    let addr = start_server(directory.clone()).await;
    let mut ws = connect(addr).await;

    let state = next_of_type(&mut ws, "gameState").await;
    let players = state["gameState"]["players"].as_array().unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(state["gameState"]["board"].as_array().unwrap().len(), 40);
    assert!(state["remaining"].as_u64().unwrap() <= 180);
    assert_eq!(directory.len(), 1);
}

#[tokio::test]
async fn test_join_move_and_chat_round_trip() {
    let directory = RoomDirectory::new();
    let addr = start_server(directory.clone()).await;
    let mut ws = connect(addr).await;
    next_of_type(&mut ws, "gameState").await;

    send(&mut ws, json!({"type": "join", "name": "alice"})).await;
    send(&mut ws, json!({"type": "move", "direction": "left", "speed": 100})).await;
    let update = next_of_type(&mut ws, "positionUpdate").await;
    assert_eq!(update["x"], 0);
    assert!(update["playerId"].is_string());

    send(&mut ws, json!({"type": "chat", "message": "hi"})).await;
    let chat = next_of_type(&mut ws, "chat").await;
    assert_eq!(chat["name"], "alice");
    assert_eq!(chat["chatMessage"], "hi");

    let snapshot = next_of_type(&mut ws, "gameState").await;
    assert_eq!(snapshot["gameState"]["chatMessages"][0], "alice: hi");
}

#[tokio::test]
async fn test_malformed_frames_keep_connection_open() {
    let directory = RoomDirectory::new();
    let addr = start_server(directory.clone()).await;
    let mut ws = connect(addr).await;
    next_of_type(&mut ws, "gameState").await;

    ws.send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    send(&mut ws, json!({"type": "teleport"})).await;
    send(&mut ws, json!({"type": "move", "direction": "sideways"})).await;

    send(&mut ws, json!({"type": "chat", "message": "still here"})).await;
    let chat = next_of_type(&mut ws, "chat").await;
    assert_eq!(chat["chatMessage"], "still here");
}

#[tokio::test]
async fn test_second_client_is_announced_to_first() {
    let directory = RoomDirectory::new();
    let addr = start_server(directory.clone()).await;
    let mut first = connect(addr).await;
    next_of_type(&mut first, "gameState").await;

    let mut second = connect(addr).await;
    next_of_type(&mut first, "playerJoined").await;
    let state = next_of_type(&mut second, "gameState").await;
    assert_eq!(state["gameState"]["players"].as_array().unwrap().len(), 2);
    assert_eq!(directory.len(), 1);
}

#[tokio::test]
async fn test_disconnect_removes_room() {
    let directory = RoomDirectory::new();
    let addr = start_server(directory.clone()).await;
    let mut first = connect(addr).await;
    let mut second = connect(addr).await;
    next_of_type(&mut first, "gameState").await;
    next_of_type(&mut second, "gameState").await;
    assert_eq!(directory.len(), 1);

    first.close(None).await.unwrap();
    second.close(None).await.unwrap();
    wait_until_empty(&directory).await;
}
