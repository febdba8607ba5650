//! A session: one admitted connection plus borrowed shared services.
//!
//! Sessions never own the token manager or the notification channel. The
//! dispatcher lends the same two instances to every session in turn, which
//! is how a token refreshed in one session is what the next one sees.

use std::future::Future;
use std::net::SocketAddr;

use comet_services::{CredentialRefresh, NotificationSink};
use comet_transport::{Connection, ConnectionId, TransportError};

use crate::CometError;

/// Everything a protocol handler can touch while serving one client.
pub struct Session<'a, C, R, N> {
    connection: C,
    tokens: &'a R,
    notifications: &'a N,
}

impl<'a, C, R, N> Session<'a, C, R, N>
where
    C: Connection,
    R: CredentialRefresh,
    N: NotificationSink,
{
    /// Binds an admitted connection to the shared services.
    pub fn new(connection: C, tokens: &'a R, notifications: &'a N) -> Self {
        Self {
            connection,
            tokens,
            notifications,
        }
    }

    /// The client's connection.
    pub fn connection(&self) -> &C {
        &self.connection
    }

    /// Identifier of the client's connection, for logging.
    pub fn id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Address the client connected from. Always `127.0.0.1` for sessions
    /// the gate admitted.
    pub fn peer_addr(&self) -> SocketAddr {
        self.connection.peer_addr()
    }

    /// The process-wide credential refresh service.
    pub fn tokens(&self) -> &'a R {
        self.tokens
    }

    /// The process-wide notification channel.
    pub fn notifications(&self) -> &'a N {
        self.notifications
    }

    /// Ends the session by closing its connection.
    pub async fn close(self) -> Result<(), TransportError> {
        self.connection.close().await
    }
}

/// Drives one session from its first frame to its last.
///
/// The dispatcher awaits `handle` to completion before accepting the next
/// client. Returning an error (or panicking) only ends this session: the
/// dispatcher logs it, closes the connection, and keeps listening.
///
/// # Example
///
/// ```rust,ignore
/// struct Echo;
///
/// impl<C, R, N> ProtocolHandler<C, R, N> for Echo
/// where
///     C: Connection,
///     R: CredentialRefresh,
///     N: NotificationSink,
/// {
///     async fn handle(&self, session: &Session<'_, C, R, N>) -> Result<(), CometError> {
///         while let Some(frame) = session.connection().recv().await? {
///             session.connection().send(&frame).await?;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ProtocolHandler<C, R, N>: Send + Sync + 'static
where
    C: Connection,
    R: CredentialRefresh,
    N: NotificationSink,
{
    /// Serves the client on `session` until it is done.
    fn handle(
        &self,
        session: &Session<'_, C, R, N>,
    ) -> impl Future<Output = Result<(), CometError>> + Send;
}
