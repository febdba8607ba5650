//! Session wire protocol for Comet.
//!
//! This crate defines what a local client and a bridge session say to each
//! other once the loopback gate has let the client in:
//!
//! - **Types** ([`Envelope`], [`ClientMessage`], [`ServerMessage`]): the
//!   structures carried in each transport frame.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those structures become
//!   bytes and back.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (Envelope) → Session handler
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientMessage, Envelope, PROTOCOL_VERSION, ServerMessage};
