//! Credential resolution for Comet.
//!
//! Before the bridge binds its socket it needs exactly one
//! [`CredentialTriple`]: an access token, a refresh token and a user id.
//! This crate produces it from a [`CredentialSource`]:
//!
//! - [`CredentialSource::Explicit`]: values given on the command line; all
//!   three must be present.
//! - [`CredentialSource::Launcher`]: the Heroic launcher's persisted GOG
//!   session file, found through the platform rules in [`launcher`].
//!
//! Any failure is a [`CredentialError`] and is meant to stop the process.

mod error;
pub mod launcher;
mod resolver;
mod triple;

pub use error::CredentialError;
pub use launcher::ACCOUNT_ID;
pub use resolver::{CredentialSource, ExplicitCredentials, LauncherConfig, resolve};
pub use triple::CredentialTriple;
