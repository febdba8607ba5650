//! The notification channel: out-of-band notices sent to the remote service.
//!
//! Sessions don't open their own connection to the notification service.
//! They hand notices to the process-wide [`NotificationPusher`], which keeps
//! one WebSocket open across sessions and reconnects lazily after a failure.

use std::fmt;
use std::future::Future;

use futures_util::SinkExt;
use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::ServiceError;

/// Where notices go unless told otherwise.
pub const DEFAULT_PUSHER_URL: &str = "wss://notifications-pusher.gog.com/";

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// One out-of-band notice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    /// What the notice is about, e.g. `"presence"`.
    pub topic: String,
    /// Free-form payload.
    pub body: String,
}

/// What a session needs from the notification channel.
pub trait NotificationSink: Send + Sync + 'static {
    /// Delivers `notice` to the remote service.
    fn push(&self, notice: Notice) -> impl Future<Output = Result<(), ServiceError>> + Send;
}

/// The frame actually written to the socket: the notice, stamped with the
/// account it belongs to.
#[derive(Serialize)]
struct OutgoingNotice<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    notice: &'a Notice,
}

/// Pushes notices over a single, lazily opened WebSocket.
///
/// The socket is opened on the first push, authenticated with
/// `Authorization: Bearer <access token>` and an `X-User-Id` header. If a
/// write fails the socket is dropped and the next push reconnects.
///
/// The bearer is the access token given at construction and is never
/// updated: a reconnect after a [`TokenManager`](crate::TokenManager)
/// refresh still presents the original token.
pub struct NotificationPusher {
    endpoint: String,
    access_token: String,
    user_id: String,
    socket: Mutex<Option<WsStream>>,
}

impl NotificationPusher {
    /// Creates a pusher for [`DEFAULT_PUSHER_URL`]. Nothing is opened yet.
    pub fn new(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self::with_endpoint(DEFAULT_PUSHER_URL, access_token, user_id)
    }

    /// Creates a pusher for an explicit `ws://` or `wss://` URL.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        access_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            access_token: access_token.into(),
            user_id: user_id.into(),
            socket: Mutex::new(None),
        }
    }

    /// Whether a socket is currently open.
    pub async fn is_connected(&self) -> bool {
        self.socket.lock().await.is_some()
    }

    /// Sends a close frame and drops the socket, if one is open.
    pub async fn close(&self) {
        if let Some(mut ws) = self.socket.lock().await.take() {
            if let Err(e) = ws.close(None).await {
                tracing::debug!(error = %e, "notification socket close failed");
            }
        }
    }

    async fn connect(&self) -> Result<WsStream, ServiceError> {
        let mut request = self.endpoint.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token))
                .map_err(|_| ServiceError::InvalidHeader("Authorization"))?,
        );
        headers.insert(
            "X-User-Id",
            HeaderValue::from_str(&self.user_id)
                .map_err(|_| ServiceError::InvalidHeader("X-User-Id"))?,
        );

        let (ws, _response) = tokio_tungstenite::connect_async(request).await?;
        tracing::info!(endpoint = %self.endpoint, "notification channel connected");
        Ok(ws)
    }
}

impl fmt::Debug for NotificationPusher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationPusher")
            .field("endpoint", &self.endpoint)
            .field("user_id", &self.user_id)
            .finish_non_exhaustive()
    }
}

impl NotificationSink for NotificationPusher {
    async fn push(&self, notice: Notice) -> Result<(), ServiceError> {
        let frame = serde_json::to_string(&OutgoingNotice {
            user_id: &self.user_id,
            notice: &notice,
        })?;

        let mut socket = self.socket.lock().await;
        let mut ws = match socket.take() {
            Some(ws) => ws,
            None => self.connect().await?,
        };

        if let Err(e) = ws.send(Message::Text(frame.into())).await {
            tracing::warn!(error = %e, topic = %notice.topic, "notification push failed, dropping socket");
            return Err(e.into());
        }
        *socket = Some(ws);
        tracing::debug!(topic = %notice.topic, "notification pushed");
        Ok(())
    }
}
