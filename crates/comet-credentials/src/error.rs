//! Error types for credential resolution.

use std::path::PathBuf;

/// Everything that can stop the bridge from obtaining a credential triple.
///
/// All variants are fatal: the process reports them and exits before any
/// socket is bound.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Explicit mode was chosen but not every value was supplied.
    /// Carries the names of the absent (or empty) values.
    #[error("missing credentials: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    /// A credential value was present but empty.
    #[error("credential field `{0}` is empty")]
    EmptyField(&'static str),

    /// The running OS has no known launcher config location.
    #[error("no launcher config location is known for this platform")]
    UnsupportedPlatform,

    /// The environment variable that anchors the launcher config path is
    /// not set.
    #[error("cannot locate launcher config: {var} is not set")]
    LauncherConfigNotFound { var: &'static str },

    /// The launcher config file could not be read.
    #[error("failed to read launcher config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The launcher config file is not the JSON shape we expect.
    #[error("malformed launcher config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The file parsed, but holds no record for the bridge's account id.
    #[error("launcher config {} has no record for account {account}", .path.display())]
    AccountNotFound { path: PathBuf, account: &'static str },
}
