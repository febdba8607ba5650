//! `CometServer` builder and the sequential dispatch loop.
//!
//! The server ties the layers together: transport → loopback gate →
//! session → protocol handler. Sessions are driven to completion one at a
//! time, inline in the accept loop; nothing is spawned. The shutdown
//! signal is watched both while accepting and while a session runs.

use std::future::Future;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::pin::{Pin, pin};

use comet_services::{CredentialRefresh, NotificationSink};
use comet_transport::{Connection, TcpTransport, Transport};
use futures_util::FutureExt;

use crate::CometError;
use crate::gate::{GateEvent, LoopbackGate};
use crate::session::{ProtocolHandler, Session};

/// Where local game clients expect to find the bridge.
pub const LISTEN_ADDR: &str = "127.0.0.1:9977";

/// Builder for a TCP-backed [`CometServer`].
///
/// # Example
///
/// ```rust,ignore
/// use comet::prelude::*;
///
/// let server = CometServer::builder()
///     .bind("127.0.0.1:9977")
///     .build(tokens, notifications, BridgeHandler::default())
///     .await?;
/// server.run_until(shutdown_signal).await
/// ```
#[derive(Debug, Clone)]
pub struct CometServerBuilder {
    bind_addr: String,
}

impl CometServerBuilder {
    /// Creates a builder that will bind [`LISTEN_ADDR`].
    pub fn new() -> Self {
        Self {
            bind_addr: LISTEN_ADDR.to_string(),
        }
    }

    /// Sets the address to bind the listener to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server.
    ///
    /// # Errors
    /// Returns `CometError::Transport` wrapping `BindFailed` if the address
    /// is unavailable. There is no retry and no fallback port.
    pub async fn build<H, R, N>(
        self,
        tokens: R,
        notifications: N,
        handler: H,
    ) -> Result<CometServer<TcpTransport, H, R, N>, CometError>
    where
        H: ProtocolHandler<<TcpTransport as Transport>::Connection, R, N>,
        R: CredentialRefresh,
        N: NotificationSink,
    {
        let transport = TcpTransport::bind(&self.bind_addr).await?;
        Ok(CometServer::new(transport, handler, tokens, notifications))
    }
}

impl Default for CometServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound bridge, ready to serve local clients.
///
/// Owns exactly one instance of each shared service. Every session borrows
/// those same instances.
pub struct CometServer<T, H, R, N> {
    transport: T,
    handler: H,
    tokens: R,
    notifications: N,
}

impl CometServer<(), (), (), ()> {
    /// Creates a new builder.
    pub fn builder() -> CometServerBuilder {
        CometServerBuilder::new()
    }
}

impl<H, R, N> CometServer<TcpTransport, H, R, N> {
    /// Returns the local address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }
}

impl<T, H, R, N> CometServer<T, H, R, N>
where
    T: Transport,
    H: ProtocolHandler<T::Connection, R, N>,
    R: CredentialRefresh,
    N: NotificationSink,
{
    /// Assembles a server from an already bound transport.
    pub fn new(transport: T, handler: H, tokens: R, notifications: N) -> Self {
        Self {
            transport,
            handler,
            tokens,
            notifications,
        }
    }

    /// The shared credential refresh service.
    pub fn tokens(&self) -> &R {
        &self.tokens
    }

    /// The shared notification channel.
    pub fn notifications(&self) -> &N {
        &self.notifications
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// `shutdown` is raced against accepting and against the session in
    /// progress. Sessions still run one at a time, but an idle client
    /// cannot hold the process open: on shutdown the current session is
    /// abandoned, its connection closed, and then the listener.
    ///
    /// # Errors
    /// Only closing the listener on shutdown can fail. Accept errors and
    /// session errors are logged and the loop carries on.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), CometError>
    where
        F: Future<Output = ()>,
    {
        let Self {
            transport,
            handler,
            tokens,
            notifications,
        } = self;
        let mut gate = LoopbackGate::new(transport);
        let mut shutdown = pin!(shutdown);

        tracing::info!("comet bridge accepting connections");

        loop {
            match gate.next(shutdown.as_mut()).await {
                Ok(GateEvent::Admitted(conn)) => {
                    let end =
                        serve_session(&handler, conn, &tokens, &notifications, shutdown.as_mut())
                            .await;
                    if end == SessionEnd::Interrupted {
                        tracing::info!("shutdown requested, closing listener");
                        gate.close().await?;
                        return Ok(());
                    }
                }
                Ok(GateEvent::Rejected(_)) => {}
                Ok(GateEvent::Cancelled) => {
                    tracing::info!("shutdown requested, closing listener");
                    gate.close().await?;
                    return Ok(());
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}

/// How a session came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    /// The handler returned, failed or panicked.
    Finished,
    /// The shutdown signal fired first.
    Interrupted,
}

/// Drives one admitted connection through the handler, then closes it.
///
/// Errors and panics from the handler stop here. If `shutdown` resolves
/// first the handler future is dropped mid-flight.
async fn serve_session<C, H, R, N, F>(
    handler: &H,
    conn: C,
    tokens: &R,
    notifications: &N,
    shutdown: Pin<&mut F>,
) -> SessionEnd
where
    C: Connection,
    H: ProtocolHandler<C, R, N>,
    R: CredentialRefresh,
    N: NotificationSink,
    F: Future<Output = ()>,
{
    let session = Session::new(conn, tokens, notifications);
    let id = session.id();
    let peer = session.peer_addr();
    tracing::info!(%id, %peer, "session started");

    let outcome = tokio::select! {
        biased;
        () = shutdown => None,
        outcome = AssertUnwindSafe(handler.handle(&session)).catch_unwind() => Some(outcome),
    };

    let end = match outcome {
        None => {
            tracing::info!(%id, "shutdown requested, abandoning session");
            SessionEnd::Interrupted
        }
        Some(Ok(Ok(()))) => {
            tracing::info!(%id, "session finished");
            SessionEnd::Finished
        }
        Some(Ok(Err(e))) => {
            tracing::warn!(%id, error = %e, "session ended with error");
            SessionEnd::Finished
        }
        Some(Err(_)) => {
            tracing::error!(%id, "session handler panicked");
            SessionEnd::Finished
        }
    };

    if let Err(e) = session.close().await {
        tracing::debug!(%id, error = %e, "closing session connection failed");
    }
    end
}
