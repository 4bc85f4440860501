//! End-to-end checks against a live server on an ephemeral port

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{timeout, Duration};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use drawphone_rs::{router, AppState};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::new(AppState::default()));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn open(addr: SocketAddr, cookie: Option<&'static str>) -> (WsStream, Option<String>) {
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    if let Some(cookie) = cookie {
        request
            .headers_mut()
            .insert("Cookie", HeaderValue::from_static(cookie));
    }
    let (ws, response) = connect_async(request).await.unwrap();
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    (ws, set_cookie)
}

async fn next_json(ws: &mut WsStream) -> Value {
    loop {
        let frame = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .unwrap();
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(ws: &mut WsStream, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_new_connection_gets_identity_cookie() {
    let addr = spawn_server().await;
    let (mut ws, set_cookie) = open(addr, None).await;

    let assigned = next_json(&mut ws).await;
    assert_eq!(assigned["type"], "ASSIGN_USER_ID");
    let user_id = assigned["userId"].as_str().unwrap();

    let set_cookie = set_cookie.unwrap();
    assert!(set_cookie.starts_with(&format!("X-UserId={}", user_id)));
}

#[tokio::test]
async fn test_cookie_identity_is_reused() {
    let addr = spawn_server().await;
    let (mut ws, _) = open(addr, Some("X-UserId=tester-1")).await;

    let assigned = next_json(&mut ws).await;
    assert_eq!(assigned["userId"], "tester-1");
}

#[tokio::test]
async fn test_join_room_over_socket() {
    let addr = spawn_server().await;
    let (mut ws, _) = open(addr, Some("X-UserId=joiner")).await;
    next_json(&mut ws).await;

    // Garbage is logged and skipped without closing the socket
    ws.send(Message::Text("not json".to_string())).await.unwrap();

    send_json(
        &mut ws,
        json!({"type": "PLAYER_UPDATED", "player": {"name": "Joiner", "avatar": "owl"}}),
    )
    .await;
    send_json(&mut ws, json!({"type": "JOIN_ROOM", "roomId": "lobby-1"})).await;

    let sync = next_json(&mut ws).await;
    assert_eq!(sync["type"], "ROOM_SYNC");
    assert_eq!(sync["room"]["id"], "lobby-1");
    assert_eq!(sync["room"]["players"][0]["id"], "joiner");
    assert_eq!(sync["room"]["players"][0]["name"], "Joiner");
    assert_eq!(sync["room"]["game"]["state"], "lobby");
    assert_eq!(sync["room"]["game"]["currentRound"], -1);
}

#[tokio::test]
async fn test_newest_connection_wins() {
    let addr = spawn_server().await;
    let (mut first, _) = open(addr, Some("X-UserId=twin")).await;
    next_json(&mut first).await;

    let (mut second, _) = open(addr, Some("X-UserId=twin")).await;
    next_json(&mut second).await;

    // The replaced socket is closed by the server
    let closed = timeout(Duration::from_secs(5), async {
        while let Some(Ok(frame)) = first.next().await {
            if frame.is_close() {
                break;
            }
        }
    })
    .await;
    assert!(closed.is_ok());

    send_json(&mut second, json!({"type": "JOIN_ROOM", "roomId": "r"})).await;
    assert_eq!(next_json(&mut second).await["type"], "ROOM_SYNC");
}

#[tokio::test]
async fn test_health_endpoint() {
    let addr = spawn_server().await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));
}
