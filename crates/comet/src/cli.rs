//! Command-line interface.
//!
//! Game launchers tend to pass their own flags through to whatever they
//! start, so anything the bridge does not recognise is dropped before clap
//! sees it instead of being treated as a usage error.

use clap::Parser;
use comet_credentials::{CredentialSource, ExplicitCredentials, LauncherConfig};

/// Flags that take a value.
const VALUE_FLAGS: &[&str] = &["--token", "--refresh-token", "--user-id", "--log-level"];

/// Flags that stand alone.
const SWITCH_FLAGS: &[&str] = &["--from-heroic", "-h", "--help", "-V", "--version"];

#[derive(Debug, Parser)]
#[command(
    name = "comet",
    version,
    about = "Loopback bridge between local game clients and a GOG account"
)]
pub struct Cli {
    /// Access token for the account.
    #[arg(long)]
    pub token: Option<String>,

    /// Refresh token for the account.
    #[arg(long)]
    pub refresh_token: Option<String>,

    /// Numeric user id of the account.
    #[arg(long)]
    pub user_id: Option<String>,

    /// Load credentials from the Heroic launcher's GOG session instead.
    /// Any --token, --refresh-token or --user-id is ignored.
    #[arg(long, default_value_t = false)]
    pub from_heroic: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

impl Cli {
    /// Parses the process arguments, ignoring unknown flags.
    ///
    /// # Errors
    /// Returns clap's error for malformed known flags, and for `--help` /
    /// `--version` (which clap reports as errors that print and exit 0).
    pub fn parse_known() -> Result<Self, clap::Error> {
        Self::parse_known_from(std::env::args())
    }

    /// Like [`parse_known`](Self::parse_known), over an explicit argument
    /// list whose first item is the program name.
    pub fn parse_known_from<I>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::try_parse_from(retain_known(args.into_iter().map(Into::into)))
    }

    /// Where credentials should come from.
    pub fn credential_source(&self) -> CredentialSource {
        if self.from_heroic {
            return CredentialSource::Launcher(LauncherConfig::Discover);
        }
        CredentialSource::Explicit(ExplicitCredentials {
            access_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
            user_id: self.user_id.clone(),
        })
    }
}

/// Keeps the program name, known flags and the values of known value flags.
fn retain_known(mut args: impl Iterator<Item = String>) -> Vec<String> {
    let mut kept: Vec<String> = args.next().into_iter().collect();

    while let Some(arg) = args.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            kept.push(arg);
            kept.extend(args.next());
        } else if SWITCH_FLAGS.contains(&arg.as_str()) || is_inline_value_flag(&arg) {
            kept.push(arg);
        } else {
            tracing::trace!(%arg, "ignoring unrecognised argument");
        }
    }
    kept
}

/// `--flag=value` for one of the known value flags.
fn is_inline_value_flag(arg: &str) -> bool {
    arg.split_once('=')
        .is_some_and(|(flag, _)| VALUE_FLAGS.contains(&flag))
}
