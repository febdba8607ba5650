//! Message types exchanged between a local client and a bridge session.
//!
//! Every frame on the loopback socket carries exactly one [`Envelope`].
//! Clients send `Envelope<ClientMessage>`, the bridge answers with
//! `Envelope<ServerMessage>` echoing the request's `seq`.

use serde::{Deserialize, Serialize};

/// The current protocol version. Clients must send this in their
/// handshake or be rejected.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// The outer wrapper of every message.
///
/// `seq` is chosen by the client and copied into the matching response, so
/// a client can pair replies with requests without tracking order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<M> {
    /// Request/response correlation number.
    pub seq: u64,
    /// The message itself.
    pub payload: M,
}

impl<M> Envelope<M> {
    /// Wraps a message with the given sequence number.
    pub fn new(seq: u64, payload: M) -> Self {
        Self { seq, payload }
    }
}

// ---------------------------------------------------------------------------
// Client → bridge
// ---------------------------------------------------------------------------

/// Requests a local client can make.
///
/// Internally tagged, so `GetAccessToken` travels as
/// `{ "type": "GetAccessToken" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Must be the first message of every session.
    Handshake { version: u32 },

    /// Asks which account this bridge is signed in as.
    GetUserInfo,

    /// Asks for a usable access token. The bridge refreshes first if the
    /// current token is known to be expired.
    GetAccessToken,

    /// Forces a token refresh regardless of expiry.
    RefreshAccessToken,

    /// Hands a notice to the bridge for delivery to the remote service.
    PushNotification { topic: String, body: String },

    /// Keep-alive. `client_time` is echoed back untouched.
    Heartbeat { client_time: u64 },

    /// The client is done with this session.
    Disconnect { reason: String },
}

// ---------------------------------------------------------------------------
// Bridge → client
// ---------------------------------------------------------------------------

/// Responses the bridge sends back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Handshake accepted; tells the client whose account it is using.
    HandshakeAck { version: u32, user_id: String },

    /// Reply to [`ClientMessage::GetUserInfo`].
    UserInfo { user_id: String },

    /// Reply to [`ClientMessage::GetAccessToken`] and
    /// [`ClientMessage::RefreshAccessToken`].
    AccessToken { access_token: String },

    /// The notice was handed to the notification channel.
    NotificationQueued,

    /// Reply to [`ClientMessage::Heartbeat`].
    HeartbeatAck { client_time: u64 },

    /// Something went wrong. `code` follows HTTP-style conventions
    /// (400 bad request, 502 upstream failure, ...).
    Error { code: u16, message: String },
}
