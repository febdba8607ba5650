//! Reading credentials from the Heroic launcher's GOG store.
//!
//! Heroic keeps the GOG session it obtained in `heroic/gog_store/auth.json`
//! under the user's config directory. The file is a JSON object keyed by
//! OAuth client id; the record under [`ACCOUNT_ID`] holds the tokens we
//! need:
//!
//! ```json
//! {
//!   "46899977096215655": {
//!     "access_token": "...",
//!     "refresh_token": "...",
//!     "user_id": "4876543210987654321",
//!     "expires_in": 3600
//!   }
//! }
//! ```
//!
//! The file is only ever read.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{CredentialError, CredentialTriple};

/// The client id the bridge authenticates as. Only the record under this key
/// is usable; other records in the file are ignored.
pub const ACCOUNT_ID: &str = "46899977096215655";

const FLATPAK_APP_DIR: &str = ".var/app/com.heroicgameslauncher.hgl/config";

// ---------------------------------------------------------------------------
// Path discovery
// ---------------------------------------------------------------------------

/// Desktop platforms with a known launcher config location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    Windows,
    MacOs,
}

impl Platform {
    /// The platform this binary was compiled for, if it is one we know.
    pub fn current() -> Option<Self> {
        if cfg!(target_os = "linux") {
            Some(Self::Linux)
        } else if cfg!(target_os = "windows") {
            Some(Self::Windows)
        } else if cfg!(target_os = "macos") {
            Some(Self::MacOs)
        } else {
            None
        }
    }
}

/// Computes where the launcher keeps `auth.json` on `platform`.
///
/// `env` looks up environment variables (empty values count as unset) and
/// `exists` checks the filesystem. On Linux the Flatpak sandbox path is
/// checked first and wins whenever the file is there.
///
/// # Errors
/// Returns [`CredentialError::LauncherConfigNotFound`] when the variable
/// anchoring the path is unset.
pub fn launcher_config_path(
    platform: Platform,
    env: impl Fn(&str) -> Option<String>,
    exists: impl Fn(&Path) -> bool,
) -> Result<PathBuf, CredentialError> {
    let var = |name: &str| env(name).filter(|value| !value.is_empty());
    let store = |base: PathBuf| base.join("heroic").join("gog_store").join("auth.json");

    match platform {
        Platform::Linux => {
            let home = var("HOME").map(PathBuf::from);
            if let Some(home) = &home {
                let flatpak = store(home.join(FLATPAK_APP_DIR));
                if exists(&flatpak) {
                    return Ok(flatpak);
                }
            }
            let config_home = match var("XDG_CONFIG_HOME") {
                Some(dir) => PathBuf::from(dir),
                None => home
                    .ok_or(CredentialError::LauncherConfigNotFound { var: "HOME" })?
                    .join(".config"),
            };
            Ok(store(config_home))
        }
        Platform::Windows => {
            let appdata = var("APPDATA")
                .ok_or(CredentialError::LauncherConfigNotFound { var: "APPDATA" })?;
            Ok(store(PathBuf::from(appdata)))
        }
        Platform::MacOs => {
            let home =
                var("HOME").ok_or(CredentialError::LauncherConfigNotFound { var: "HOME" })?;
            Ok(store(PathBuf::from(home).join(".config")))
        }
    }
}

/// [`launcher_config_path`] for the running platform, using the real
/// environment and filesystem.
///
/// # Errors
/// [`CredentialError::UnsupportedPlatform`] on anything other than Linux,
/// Windows, or macOS; otherwise as [`launcher_config_path`].
pub fn default_launcher_config_path() -> Result<PathBuf, CredentialError> {
    let platform = Platform::current().ok_or(CredentialError::UnsupportedPlatform)?;
    launcher_config_path(platform, |name| std::env::var(name).ok(), Path::exists)
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// The fields we read from the account record. Anything else in the record
/// is ignored.
#[derive(Debug, Deserialize)]
struct StoredAccount {
    access_token: String,
    refresh_token: String,
    user_id: StoredUserId,
}

/// Heroic has written `user_id` both as a string and as a bare number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredUserId {
    Text(String),
    Number(u64),
}

impl StoredUserId {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Reads and parses the launcher file at `path`.
///
/// # Errors
/// Every failure is fatal and reported as-is: unreadable file
/// ([`ReadConfig`](CredentialError::ReadConfig)), invalid JSON or a record
/// with missing keys ([`ParseConfig`](CredentialError::ParseConfig)), no
/// record for [`ACCOUNT_ID`]
/// ([`AccountNotFound`](CredentialError::AccountNotFound)), or empty values
/// ([`EmptyField`](CredentialError::EmptyField)).
pub fn load_launcher_config(path: &Path) -> Result<CredentialTriple, CredentialError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::ReadConfig {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |source| CredentialError::ParseConfig {
        path: path.to_path_buf(),
        source,
    };
    let mut accounts: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(&raw).map_err(parse_err)?;

    let record = accounts
        .remove(ACCOUNT_ID)
        .ok_or_else(|| CredentialError::AccountNotFound {
            path: path.to_path_buf(),
            account: ACCOUNT_ID,
        })?;
    let stored: StoredAccount = serde_json::from_value(record).map_err(parse_err)?;

    tracing::debug!(path = %path.display(), "loaded launcher credentials");
    CredentialTriple::new(
        stored.access_token,
        stored.refresh_token,
        stored.user_id.into_string(),
    )
}
