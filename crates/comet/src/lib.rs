//! # Comet
//!
//! A loopback bridge that lets local game clients use a GOG account
//! without ever holding its long-lived credentials.
//!
//! Comet resolves one set of account credentials at startup, then listens
//! on `127.0.0.1:9977`. Only connections whose peer address is exactly
//! `127.0.0.1` are served, one at a time, each borrowing the same token
//! manager and notification channel.
//!
//! ## Architecture
//!
//! ```text
//! Local game client
//!     ↕  length-prefixed JSON frames over TCP
//! Loopback gate (rejects anything not from 127.0.0.1)
//!     ↕
//! Session dispatcher (one session at a time)
//!     ↕  &TokenManager, &NotificationPusher
//! Protocol handler
//!     ↕  HTTPS / WebSocket
//! GOG services
//! ```

pub mod app;
pub mod cli;
mod error;
pub mod gate;
pub mod handler;
pub mod server;
pub mod session;

pub use error::CometError;

/// Convenience re-exports for embedding the bridge or writing a handler.
pub mod prelude {
    pub use crate::CometError;
    pub use crate::app::{Bridge, launch};
    pub use crate::gate::{GateEvent, LoopbackGate, is_trusted_peer};
    pub use crate::handler::BridgeHandler;
    pub use crate::server::{CometServer, CometServerBuilder, LISTEN_ADDR};
    pub use crate::session::{ProtocolHandler, Session};

    pub use comet_credentials::{CredentialSource, CredentialTriple, ExplicitCredentials};
    pub use comet_protocol::{ClientMessage, Codec, Envelope, JsonCodec, ServerMessage};
    pub use comet_services::{
        CredentialRefresh, Notice, NotificationPusher, NotificationSink, TokenManager,
    };
    pub use comet_transport::{Connection, Transport};
}
