//! Integration tests for the notification pusher.
//!
//! These tests run a real WebSocket server on an OS-assigned loopback port
//! and point the pusher at it with a `ws://` URL.

use std::sync::{Arc, Mutex};

use comet_services::{Notice, NotificationPusher, NotificationSink, ServiceError};
use futures_util::StreamExt;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

/// Headers captured from the pusher's upgrade request.
#[derive(Debug, Default, Clone)]
struct SeenHeaders {
    authorization: Option<String>,
    user_id: Option<String>,
}

/// Accepts one WebSocket client, records its auth headers, and collects
/// `expected` text frames.
async fn serve_one(
    listener: TcpListener,
    seen: Arc<Mutex<SeenHeaders>>,
    expected: usize,
) -> Vec<serde_json::Value> {
    let (stream, _) = listener.accept().await.expect("accept");
    let callback = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let mut seen = seen.lock().unwrap();
        seen.authorization = header("authorization");
        seen.user_id = header("x-user-id");
        Ok(resp)
    };
    let mut ws = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .expect("handshake");

    let mut frames = Vec::new();
    while frames.len() < expected {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => {
                frames.push(serde_json::from_str(text.as_str()).expect("json frame"));
            }
            Some(Ok(_)) => continue,
            _ => break,
        }
    }
    frames
}

fn notice(topic: &str, body: &str) -> Notice {
    Notice {
        topic: topic.into(),
        body: body.into(),
    }
}

#[tokio::test]
async fn test_pusher_authenticates_and_sends_json_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(SeenHeaders::default()));
    let server = tokio::spawn(serve_one(listener, Arc::clone(&seen), 2));

    let pusher = NotificationPusher::with_endpoint(format!("ws://{addr}/"), "at-0", "42");
    pusher.push(notice("presence", "online")).await.expect("first push");
    assert!(pusher.is_connected().await);
    // Second push reuses the same socket: the server only accepts once.
    pusher.push(notice("achievement", "unlocked")).await.expect("second push");

    let frames = server.await.unwrap();
    assert_eq!(
        frames,
        vec![
            serde_json::json!({ "user_id": "42", "topic": "presence", "body": "online" }),
            serde_json::json!({ "user_id": "42", "topic": "achievement", "body": "unlocked" }),
        ]
    );

    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.authorization.as_deref(), Some("Bearer at-0"));
    assert_eq!(seen.user_id.as_deref(), Some("42"));

    pusher.close().await;
    assert!(!pusher.is_connected().await);
}

#[tokio::test]
async fn test_pusher_reports_unreachable_endpoint() {
    // Grab a free port, then release it so nothing is listening there.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let pusher = NotificationPusher::with_endpoint(format!("ws://{addr}/"), "at-0", "42");
    let err = pusher.push(notice("presence", "online")).await.unwrap_err();

    assert!(matches!(err, ServiceError::WebSocket(_)));
    assert!(!pusher.is_connected().await);
}
