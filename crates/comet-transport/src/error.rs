use std::net::SocketAddr;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listening endpoint could not be bound (address in use,
    /// permission denied, ...). Never retried.
    #[error("unable to bind to {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting an incoming connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// A frame exceeded [`MAX_FRAME_LEN`](crate::MAX_FRAME_LEN), either on
    /// the way out or as announced by the peer's length prefix.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    /// The connection was closed.
    #[error("connection to {peer} closed: {reason}")]
    ConnectionClosed { peer: SocketAddr, reason: String },
}
