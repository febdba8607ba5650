//! Turning a credential source into exactly one [`CredentialTriple`].

use std::path::PathBuf;

use crate::launcher::{default_launcher_config_path, load_launcher_config};
use crate::{CredentialError, CredentialTriple};

/// Values supplied directly by the operator. Any of them may be absent;
/// [`resolve`] decides whether that is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplicitCredentials {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user_id: Option<String>,
}

/// Where the launcher config file lives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LauncherConfig {
    /// Use the platform's standard location.
    #[default]
    Discover,
    /// Use this exact file.
    At(PathBuf),
}

/// The one place credentials are taken from.
///
/// The variants are exclusive: a launcher source carries no explicit values,
/// so there is nothing to merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// Read the persisted launcher configuration.
    Launcher(LauncherConfig),
    /// Use operator-supplied values; all three are required.
    Explicit(ExplicitCredentials),
}

/// Resolves `source` into a validated triple.
///
/// # Errors
/// - Launcher source: whatever locating or reading the file produced. There
///   is no fallback to any other source.
/// - Explicit source: [`CredentialError::MissingCredentials`] listing every
///   absent or empty value.
pub fn resolve(source: &CredentialSource) -> Result<CredentialTriple, CredentialError> {
    match source {
        CredentialSource::Launcher(config) => {
            let path = match config {
                LauncherConfig::Discover => default_launcher_config_path()?,
                LauncherConfig::At(path) => path.clone(),
            };
            tracing::info!(path = %path.display(), "loading credentials from launcher config");
            load_launcher_config(&path)
        }
        CredentialSource::Explicit(explicit) => resolve_explicit(explicit),
    }
}

fn resolve_explicit(explicit: &ExplicitCredentials) -> Result<CredentialTriple, CredentialError> {
    match (
        required("access token", &explicit.access_token),
        required("refresh token", &explicit.refresh_token),
        required("user id", &explicit.user_id),
    ) {
        (Ok(access), Ok(refresh), Ok(user)) => CredentialTriple::new(access, refresh, user),
        (access, refresh, user) => Err(CredentialError::MissingCredentials {
            missing: [access.err(), refresh.err(), user.err()]
                .into_iter()
                .flatten()
                .collect(),
        }),
    }
}

/// A present, non-empty value, or the name to report as missing.
fn required<'a>(name: &'static str, value: &'a Option<String>) -> Result<&'a str, &'static str> {
    value.as_deref().filter(|v| !v.is_empty()).ok_or(name)
}
