//! The credential triple: the one set of values that identifies the
//! signed-in account for the whole lifetime of the process.

use std::fmt;

use crate::CredentialError;

/// Access token, refresh token and user id of one authenticated account.
///
/// The only way to build one is [`CredentialTriple::new`], which refuses
/// empty values, so holding a `CredentialTriple` means all three fields are
/// usable. There are no setters: a later token refresh updates the token
/// manager's own state, never this value.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialTriple {
    access_token: String,
    refresh_token: String,
    user_id: String,
}

impl CredentialTriple {
    /// Builds a triple, rejecting any empty field.
    ///
    /// # Errors
    /// Returns [`CredentialError::EmptyField`] naming the first empty value.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let triple = Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            user_id: user_id.into(),
        };
        if triple.access_token.is_empty() {
            return Err(CredentialError::EmptyField("access_token"));
        }
        if triple.refresh_token.is_empty() {
            return Err(CredentialError::EmptyField("refresh_token"));
        }
        if triple.user_id.is_empty() {
            return Err(CredentialError::EmptyField("user_id"));
        }
        Ok(triple)
    }

    /// Short-lived bearer token for account API calls.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Long-lived token exchanged for new access tokens.
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Numeric id of the account, as a string.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Splits the triple into `(access_token, refresh_token, user_id)`.
    pub fn into_parts(self) -> (String, String, String) {
        (self.access_token, self.refresh_token, self.user_id)
    }
}

// Tokens never show up in logs.
impl fmt::Debug for CredentialTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialTriple")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
