//! Process assembly: credentials are checked before anything is bound.

use std::io::Write;
use std::path::PathBuf;

use comet::CometError;
use comet::app::launch;
use comet_credentials::{
    ACCOUNT_ID, CredentialError, CredentialSource, ExplicitCredentials, LauncherConfig,
};
use comet_services::CredentialRefresh;
use comet_transport::TransportError;

fn explicit(token: Option<&str>, refresh: Option<&str>, user: Option<&str>) -> CredentialSource {
    CredentialSource::Explicit(ExplicitCredentials {
        access_token: token.map(str::to_string),
        refresh_token: refresh.map(str::to_string),
        user_id: user.map(str::to_string),
    })
}

#[tokio::test]
async fn test_partial_credentials_fail_before_bind() {
    // Hold the port: if launch tried to bind first it would report a bind
    // error instead of the credential error.
    let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap().to_string();

    let err = launch(&explicit(Some("at"), None, Some("42")), &addr)
        .await
        .err()
        .expect("launch must fail");

    match err {
        CometError::Credentials(CredentialError::MissingCredentials { missing }) => {
            assert_eq!(missing, vec!["refresh token"]);
        }
        other => panic!("expected MissingCredentials, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreadable_launcher_file_is_a_credential_error() {
    let err = launch(
        &CredentialSource::Launcher(LauncherConfig::At(PathBuf::from(
            "/nonexistent/heroic/gog_store/auth.json",
        ))),
        "127.0.0.1:0",
    )
    .await
    .err()
    .expect("launch must fail");

    assert!(matches!(
        err,
        CometError::Credentials(CredentialError::ReadConfig { .. })
    ));
}

#[tokio::test]
async fn test_bind_failure_is_reported_after_credentials_resolve() {
    let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = held.local_addr().unwrap().to_string();

    let err = launch(&explicit(Some("at"), Some("rt"), Some("42")), &addr)
        .await
        .err()
        .expect("launch must fail");

    assert!(matches!(
        err,
        CometError::Transport(TransportError::BindFailed { .. })
    ));
}

#[tokio::test]
async fn test_launch_from_launcher_file_binds() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let record = serde_json::json!({
        "access_token": "at",
        "refresh_token": "rt",
        "user_id": "42"
    });
    let mut config = serde_json::Map::new();
    config.insert(ACCOUNT_ID.to_string(), record);
    write!(file, "{}", serde_json::Value::Object(config)).unwrap();

    let server = launch(
        &CredentialSource::Launcher(LauncherConfig::At(file.path().to_path_buf())),
        "127.0.0.1:0",
    )
    .await
    .expect("launch");

    let addr = server.local_addr().unwrap();
    assert!(addr.ip().is_loopback());
    assert_eq!(server.tokens().user_id(), "42");
}
