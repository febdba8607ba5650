//! Shared account services for Comet.
//!
//! Two services live for the whole process and are lent to every session:
//!
//! - the **credential refresh service** ([`CredentialRefresh`],
//!   implemented by [`TokenManager`]): keeps the access token usable;
//! - the **notification channel** ([`NotificationSink`], implemented by
//!   [`NotificationPusher`]): delivers out-of-band notices upstream.
//!
//! Sessions only ever see the traits, which is what lets tests substitute
//! fakes. Both production types take `&self` everywhere and lock
//! internally.
//!
//! ```text
//! Session handler
//!     ↕  &impl CredentialRefresh, &impl NotificationSink
//! Shared services (this crate)
//!     ↕  HTTPS token endpoint, WebSocket notification endpoint
//! Remote service
//! ```

mod error;
mod notify;
mod token;

pub use error::ServiceError;
pub use notify::{DEFAULT_PUSHER_URL, Notice, NotificationPusher, NotificationSink};
pub use token::{
    CredentialRefresh, DEFAULT_AUTH_URL, HttpTokenEndpoint, TokenEndpoint, TokenGrant,
    TokenManager,
};
