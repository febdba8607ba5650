//! Error types for the shared account services.

/// Errors raised by the token manager or the notification pusher.
///
/// None of these are fatal to the bridge: a session that hits one reports
/// it to its client, and the next session starts with the services intact.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The HTTP request to the token endpoint failed outright (DNS,
    /// connect, TLS, or an unreadable body).
    #[error("token endpoint request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The token endpoint answered, but not with a grant.
    #[error("token endpoint rejected the refresh ({status}): {body}")]
    TokenRejected { status: u16, body: String },

    /// The notification socket could not be opened or written.
    #[error("notification channel failed: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    /// A header built from credentials is not a valid HTTP header value.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// A notice could not be serialized.
    #[error("failed to encode notice: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for ServiceError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}
