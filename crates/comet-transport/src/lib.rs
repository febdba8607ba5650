//! Transport abstraction layer for Comet.
//!
//! Provides the [`Transport`] and [`Connection`] traits that the loopback
//! gate and the session dispatcher are written against, plus the concrete
//! [`TcpTransport`] used by the bridge process.
//!
//! Every connection carries the address of the peer that opened it. The
//! transport itself never filters on that address; deciding who may talk to
//! a session is the gate's job, one layer up.
//!
//! # Framing
//!
//! [`TcpConnection`] speaks length-prefixed frames: a 4-byte big-endian
//! length followed by that many payload bytes. Frames larger than
//! [`MAX_FRAME_LEN`] are refused in both directions.

mod error;
mod tcp;

pub use error::TransportError;
pub use tcp::{TcpConnection, TcpTransport};

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;

/// Upper bound on a single frame's payload, in bytes (1 MiB).
pub const MAX_FRAME_LEN: usize = 1024 * 1024;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
///
/// The returned futures are `Send` so a server generic over the transport
/// can still be moved onto a runtime task.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;

    /// Waits for and accepts the next incoming connection.
    ///
    /// No filtering happens here: every connection the platform accepts is
    /// returned, whatever its origin.
    fn accept(
        &mut self,
    ) -> impl Future<Output = Result<Self::Connection, TransportError>> + Send;

    /// Closes the listening endpoint. Consumes the transport so nothing can
    /// accept on it afterwards.
    fn shutdown(self) -> impl Future<Output = Result<(), TransportError>> + Send
    where
        Self: Sized;
}

/// A single connection that can send and receive frames.
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame to the remote peer.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer closed the connection cleanly
    /// between frames.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, TransportError>> + Send;

    /// Closes the connection.
    fn close(&self) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// Returns the address (IP and port) of the peer that opened this
    /// connection.
    fn peer_addr(&self) -> SocketAddr;
}
