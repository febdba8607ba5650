//! Unified error type for the Comet bridge.

use comet_credentials::CredentialError;
use comet_protocol::ProtocolError;
use comet_services::ServiceError;
use comet_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant auto-generates `From` impls, so
/// the `?` operator converts sub-crate errors automatically.
///
/// Which variants are fatal depends on where they surface: a
/// `Credentials` error or a bind failure stops the process, while anything
/// returned by a session handler is logged by the dispatcher and forgotten.
#[derive(Debug, thiserror::Error)]
pub enum CometError {
    /// No usable credential triple could be resolved.
    #[error(transparent)]
    Credentials(#[from] CredentialError),

    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A shared account service failed (token refresh, notification).
    #[error(transparent)]
    Service(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_credential_error() {
        let err = CredentialError::MissingCredentials {
            missing: vec!["user id"],
        };
        let comet_err: CometError = err.into();
        assert!(matches!(comet_err, CometError::Credentials(_)));
        assert!(comet_err.to_string().contains("user id"));
    }

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::BindFailed {
            addr: "127.0.0.1:9977".into(),
            source: std::io::Error::from(std::io::ErrorKind::AddrInUse),
        };
        let comet_err: CometError = err.into();
        assert!(matches!(comet_err, CometError::Transport(_)));
        assert!(comet_err.to_string().contains("127.0.0.1:9977"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let comet_err: CometError = err.into();
        assert!(matches!(comet_err, CometError::Protocol(_)));
    }

    #[test]
    fn test_from_service_error() {
        let err = ServiceError::TokenRejected {
            status: 401,
            body: "nope".into(),
        };
        let comet_err: CometError = err.into();
        assert!(matches!(comet_err, CometError::Service(_)));
    }
}
