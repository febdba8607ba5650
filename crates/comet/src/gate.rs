//! The loopback gate: the bridge's whole authentication boundary.
//!
//! Every connection the transport accepts passes through here before any
//! session logic sees it. Only peers whose address is exactly `127.0.0.1`
//! get through. Everyone else is closed on the spot, before a single byte
//! is read or written.
//!
//! ```text
//! Unbound → Bound → Listening ─┬→ Admitted ─┐
//!                       ↑      └→ Rejected ─┤
//!                       └───────────────────┘
//!                  (interrupt) → Terminated
//! ```

use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;

use comet_transport::{Connection, Transport, TransportError};

/// Returns `true` if `peer` may reach a session.
///
/// Exactly `127.0.0.1`: the rest of `127.0.0.0/8`, `::1`, and
/// `::ffff:127.0.0.1` are all refused.
pub fn is_trusted_peer(peer: &SocketAddr) -> bool {
    peer.ip() == IpAddr::V4(Ipv4Addr::LOCALHOST)
}

/// What one turn of the gate produced.
#[derive(Debug)]
pub enum GateEvent<C> {
    /// A loopback peer connected; the connection is ready for a session.
    Admitted(C),
    /// A non-loopback peer connected and has already been closed.
    Rejected(SocketAddr),
    /// The cancel signal fired while waiting for a connection.
    Cancelled,
}

/// Wraps a [`Transport`] and filters what it accepts by peer address.
#[derive(Debug)]
pub struct LoopbackGate<T> {
    transport: T,
}

impl<T: Transport> LoopbackGate<T> {
    /// Puts a gate in front of an already bound transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Borrows the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Waits for the next connection or for `cancel`, whichever comes first.
    ///
    /// Accepting is cancel-safe, so losing the race to `cancel` never drops
    /// a half-accepted connection. `cancel` is checked first when both are
    /// ready.
    ///
    /// # Errors
    /// Propagates accept failures from the transport. These are not fatal;
    /// the caller may simply call `next` again.
    pub async fn next<F>(
        &mut self,
        cancel: Pin<&mut F>,
    ) -> Result<GateEvent<T::Connection>, TransportError>
    where
        F: Future<Output = ()>,
    {
        let conn = tokio::select! {
            biased;
            () = cancel => return Ok(GateEvent::Cancelled),
            accepted = self.transport.accept() => accepted?,
        };

        let peer = conn.peer_addr();
        if is_trusted_peer(&peer) {
            tracing::debug!(id = %conn.id(), %peer, "connection admitted");
            return Ok(GateEvent::Admitted(conn));
        }

        tracing::debug!(id = %conn.id(), %peer, "rejecting non-loopback connection");
        if let Err(e) = conn.close().await {
            tracing::debug!(%peer, error = %e, "closing rejected connection failed");
        }
        Ok(GateEvent::Rejected(peer))
    }

    /// Closes the listening endpoint.
    pub async fn close(self) -> Result<(), TransportError> {
        self.transport.shutdown().await
    }
}
