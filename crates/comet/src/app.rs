//! Process assembly: credentials → shared services → bound server.

use comet_credentials::{CredentialSource, resolve};
use comet_services::{HttpTokenEndpoint, NotificationPusher, TokenManager};
use comet_transport::TcpTransport;

use crate::CometError;
use crate::handler::BridgeHandler;
use crate::server::{CometServer, CometServerBuilder};

/// The production bridge: TCP transport, default handler, real services.
pub type Bridge = CometServer<TcpTransport, BridgeHandler, TokenManager, NotificationPusher>;

/// Resolves credentials, builds the shared services and binds the listener.
///
/// Credentials are resolved before anything touches the network, so a
/// missing or unreadable credential source never binds a socket.
///
/// # Errors
/// - `CometError::Credentials` if no triple could be resolved.
/// - `CometError::Transport` if `listen_addr` cannot be bound.
pub async fn launch(source: &CredentialSource, listen_addr: &str) -> Result<Bridge, CometError> {
    let triple = resolve(source)?;
    tracing::info!(user_id = %triple.user_id(), "credentials resolved");

    let (access_token, refresh_token, user_id) = triple.into_parts();
    let notifications = NotificationPusher::new(access_token.clone(), user_id.clone());
    let tokens = TokenManager::new(access_token, refresh_token, user_id, HttpTokenEndpoint::new());

    let server = CometServerBuilder::new()
        .bind(listen_addr)
        .build(tokens, notifications, BridgeHandler::new())
        .await?;
    if let Ok(addr) = server.local_addr() {
        tracing::info!(%addr, "listening for local clients");
    }
    Ok(server)
}
