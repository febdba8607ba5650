//! The default protocol handler spoken on the loopback socket.
//!
//! The flow for each session is:
//!   1. Receive Handshake → validate version → send HandshakeAck
//!   2. Loop: receive envelope → call the shared services → reply with the
//!      same `seq`
//!   3. Stop on Disconnect or when the client hangs up
//!
//! Failures of the shared services are reported to the client as `Error`
//! frames and the session carries on. Transport and decoding failures end
//! the session.

use std::time::Duration;

use comet_protocol::{
    ClientMessage, Codec, Envelope, JsonCodec, PROTOCOL_VERSION, ProtocolError, ServerMessage,
};
use comet_services::{CredentialRefresh, Notice, NotificationSink};
use comet_transport::Connection;

use crate::CometError;
use crate::session::{ProtocolHandler, Session};

/// How long a freshly admitted client has to send its Handshake.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Serves token, identity and notification requests to a local client.
#[derive(Debug, Clone, Default)]
pub struct BridgeHandler<K = JsonCodec> {
    codec: K,
}

impl BridgeHandler {
    /// Creates a handler that speaks JSON envelopes.
    pub fn new() -> Self {
        Self { codec: JsonCodec }
    }
}

impl<K: Codec> BridgeHandler<K> {
    /// Creates a handler that speaks through `codec`.
    pub fn with_codec(codec: K) -> Self {
        Self { codec }
    }

    /// Receives and validates the Handshake, then acknowledges it.
    async fn handshake<C, R, N>(&self, session: &Session<'_, C, R, N>) -> Result<(), CometError>
    where
        C: Connection,
        R: CredentialRefresh,
        N: NotificationSink,
    {
        let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, session.connection().recv()).await
        {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) => {
                return Err(invalid("connection closed before handshake"));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(invalid("handshake timed out")),
        };

        let envelope: Envelope<ClientMessage> = match self.codec.decode(&data) {
            Ok(env) => env,
            Err(e) => return Err(self.reject(session, 0, "malformed handshake", e.into()).await),
        };

        let version = match envelope.payload {
            ClientMessage::Handshake { version } => version,
            _ => {
                let cause = invalid("first message must be Handshake");
                return Err(self.reject(session, envelope.seq, "expected Handshake", cause).await);
            }
        };

        if version != PROTOCOL_VERSION {
            let message = format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}");
            let cause = invalid("protocol version mismatch");
            return Err(self.reject(session, envelope.seq, &message, cause).await);
        }

        let ack = ServerMessage::HandshakeAck {
            version: PROTOCOL_VERSION,
            user_id: session.tokens().user_id().to_string(),
        };
        self.send(session, envelope.seq, ack).await
    }

    /// Answers one request. `None` means the client asked to disconnect.
    async fn respond<C, R, N>(
        &self,
        session: &Session<'_, C, R, N>,
        msg: ClientMessage,
    ) -> Option<ServerMessage>
    where
        C: Connection,
        R: CredentialRefresh,
        N: NotificationSink,
    {
        let id = session.id();
        let reply = match msg {
            ClientMessage::Handshake { .. } => error_reply(400, "already handshaken"),
            ClientMessage::GetUserInfo => ServerMessage::UserInfo {
                user_id: session.tokens().user_id().to_string(),
            },
            ClientMessage::GetAccessToken => match session.tokens().access_token().await {
                Ok(access_token) => ServerMessage::AccessToken { access_token },
                Err(e) => {
                    tracing::warn!(%id, error = %e, "access token unavailable");
                    error_reply(502, &format!("access token unavailable: {e}"))
                }
            },
            ClientMessage::RefreshAccessToken => match session.tokens().refresh().await {
                Ok(access_token) => ServerMessage::AccessToken { access_token },
                Err(e) => {
                    tracing::warn!(%id, error = %e, "token refresh failed");
                    error_reply(502, &format!("token refresh failed: {e}"))
                }
            },
            ClientMessage::PushNotification { topic, body } => {
                match session.notifications().push(Notice { topic, body }).await {
                    Ok(()) => ServerMessage::NotificationQueued,
                    Err(e) => {
                        tracing::warn!(%id, error = %e, "notification push failed");
                        error_reply(502, &format!("notification push failed: {e}"))
                    }
                }
            }
            ClientMessage::Heartbeat { client_time } => ServerMessage::HeartbeatAck { client_time },
            ClientMessage::Disconnect { reason } => {
                tracing::debug!(%id, %reason, "client disconnected");
                return None;
            }
        };
        Some(reply)
    }

    /// Tells the client why its session is ending with an `Error{400}`,
    /// then hands back `cause`. A failure to deliver the reply is only
    /// logged, so the session still ends with the original cause.
    async fn reject<C, R, N>(
        &self,
        session: &Session<'_, C, R, N>,
        seq: u64,
        message: &str,
        cause: CometError,
    ) -> CometError
    where
        C: Connection,
        R: CredentialRefresh,
        N: NotificationSink,
    {
        if let Err(e) = self.send(session, seq, error_reply(400, message)).await {
            tracing::debug!(id = %session.id(), error = %e, "could not deliver error reply");
        }
        cause
    }

    async fn send<C, R, N>(
        &self,
        session: &Session<'_, C, R, N>,
        seq: u64,
        payload: ServerMessage,
    ) -> Result<(), CometError>
    where
        C: Connection,
        R: CredentialRefresh,
        N: NotificationSink,
    {
        let bytes = self.codec.encode(&Envelope::new(seq, payload))?;
        session.connection().send(&bytes).await?;
        Ok(())
    }
}

impl<K, C, R, N> ProtocolHandler<C, R, N> for BridgeHandler<K>
where
    K: Codec,
    C: Connection,
    R: CredentialRefresh,
    N: NotificationSink,
{
    async fn handle(&self, session: &Session<'_, C, R, N>) -> Result<(), CometError> {
        let id = session.id();
        self.handshake(session).await?;
        tracing::debug!(%id, "handshake complete");

        loop {
            let Some(data) = session.connection().recv().await? else {
                tracing::debug!(%id, "client closed the connection");
                return Ok(());
            };

            let envelope: Envelope<ClientMessage> = match self.codec.decode(&data) {
                Ok(env) => env,
                Err(e) => {
                    return Err(self.reject(session, 0, "malformed message", e.into()).await);
                }
            };

            let Some(reply) = self.respond(session, envelope.payload).await else {
                return Ok(());
            };
            self.send(session, envelope.seq, reply).await?;
        }
    }
}

fn error_reply(code: u16, message: &str) -> ServerMessage {
    ServerMessage::Error {
        code,
        message: message.to_string(),
    }
}

fn invalid(reason: &str) -> CometError {
    ProtocolError::InvalidMessage(reason.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_reply_shape() {
        assert_eq!(
            error_reply(502, "upstream"),
            ServerMessage::Error {
                code: 502,
                message: "upstream".into()
            }
        );
    }

    #[test]
    fn test_invalid_is_protocol_error() {
        let err = invalid("first message must be Handshake");
        assert!(matches!(
            err,
            CometError::Protocol(ProtocolError::InvalidMessage(ref m)) if m.contains("Handshake")
        ));
    }
}
