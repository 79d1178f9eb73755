//! WebSocket integration tests
//!
//! Starts the real server on an ephemeral port and talks to it the way a
//! browser client would: JSON text frames over `/ws`.

use chitchat::{ChatServer, ServerConfig};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..Default::default()
    }
}

async fn open(addr: SocketAddr) -> Ws {
    let (mut ws, _) = connect_async(format!("ws://{}/ws", addr)).await.unwrap();
    let greeting = recv(&mut ws).await;
    assert_eq!(greeting["type"], "connected");
    assert!(greeting["connectionId"].as_str().unwrap().starts_with("conn-"));
    ws
}

async fn send(ws: &mut Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string())).await.unwrap();
}

async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn named(addr: SocketAddr, name: &str) -> Ws {
    let mut ws = open(addr).await;
    send(&mut ws, json!({"type": "set-identity", "name": name})).await;
    assert_eq!(recv(&mut ws).await, json!({"type": "identity-set", "success": true}));
    ws
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

// ─── Conversation ────────────────────────────────────────────────

#[tokio::test]
async fn test_conversation_over_websocket() {
    let server = ChatServer::start(&test_config()).await.unwrap();
    let addr = server.local_addr();

    let mut alice = named(addr, "Alice").await;
    let mut bob = named(addr, "Bob").await;

    send(&mut alice, json!({"type": "request-match"})).await;
    let waiting = recv(&mut alice).await;
    assert_eq!(waiting["type"], "waiting");

    send(&mut bob, json!({"type": "request-match"})).await;
    let started = recv(&mut bob).await;
    assert_eq!(started["type"], "chat-started");
    assert_eq!(started["partnerDisplayName"], "Alice");
    let started = recv(&mut alice).await;
    assert_eq!(started["partnerDisplayName"], "Bob");

    send(
        &mut alice,
        json!({"type": "send-message", "text": "hi", "timestamp": "1999-12-31T23:59:59Z"}),
    )
    .await;
    let message = recv(&mut bob).await;
    assert_eq!(message["type"], "receive-message");
    assert_eq!(message["text"], "hi");
    assert_eq!(message["senderDisplayName"], "Alice");
    let stamped: chrono::DateTime<chrono::Utc> =
        message["timestamp"].as_str().unwrap().parse().unwrap();
    assert!(stamped.timestamp() > 946_684_800);

    send(&mut alice, json!({"type": "end-session"})).await;
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "session-ended", "message": "Chat ended"})
    );
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "session-ended", "message": "Your chat partner disconnected"})
    );

    send(&mut alice, json!({"type": "send-message", "text": "hello?"})).await;
    assert_eq!(
        recv(&mut alice).await,
        json!({"type": "error", "message": "You are not in a chat"})
    );

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_malformed_frame_reports_error_and_keeps_socket() {
    let server = ChatServer::start(&test_config()).await.unwrap();
    let mut ws = open(server.local_addr()).await;

    ws.send(Message::Text("{not json".to_string())).await.unwrap();
    let error = recv(&mut ws).await;
    assert_eq!(error["type"], "error");
    assert!(error["message"].as_str().unwrap().starts_with("Malformed event"));

    send(&mut ws, json!({"type": "request-match"})).await;
    assert_eq!(
        recv(&mut ws).await,
        json!({"type": "error", "message": "Please set a username first"})
    );

    server.stop().await.unwrap();
}

// ─── Disconnect ──────────────────────────────────────────────────

#[tokio::test]
async fn test_closing_socket_notifies_partner() {
    let server = ChatServer::start(&test_config()).await.unwrap();
    let addr = server.local_addr();

    let mut alice = named(addr, "Alice").await;
    let mut bob = named(addr, "Bob").await;
    send(&mut alice, json!({"type": "request-match"})).await;
    recv(&mut alice).await;
    send(&mut bob, json!({"type": "request-match"})).await;
    recv(&mut bob).await;
    recv(&mut alice).await;

    alice.close(None).await.unwrap();
    assert_eq!(
        recv(&mut bob).await,
        json!({"type": "session-ended", "message": "Your chat partner disconnected"})
    );

    let stats = server.hub().stats().await.unwrap();
    assert_eq!(stats.connections, 1);
    assert_eq!(stats.sessions, 0);

    server.stop().await.unwrap();
}

// ─── HTTP ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_health_endpoint() {
    let server = ChatServer::start(&test_config()).await.unwrap();
    let addr = server.local_addr();
    let _ws = named(addr, "Alice").await;

    let response = http_get(addr, "/health").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    let body = response.split("\r\n\r\n").nth(1).unwrap();
    let json: Value = serde_json::from_str(body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["stats"]["connections"], 1);
    assert_eq!(json["stats"]["identities"], 1);

    server.stop().await.unwrap();
}

#[tokio::test]
async fn test_serves_static_client() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>chitchat</h1>").unwrap();

    let config = ServerConfig {
        static_dir: Some(dir.path().to_path_buf()),
        ..test_config()
    };
    let server = ChatServer::start(&config).await.unwrap();

    let response = http_get(server.local_addr(), "/").await;
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("<h1>chitchat</h1>"));

    let missing = http_get(server.local_addr(), "/nope.js").await;
    assert!(missing.starts_with("HTTP/1.1 404"));

    server.stop().await.unwrap();
}
