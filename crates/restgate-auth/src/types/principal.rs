//! Authenticated principal and credential envelope.

use serde::{Deserialize, Serialize};

use crate::storage::User;

/// Identity resolved for an allowed request.
///
/// Inserted into the request extensions by the gateway middleware.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// User identifier in the user store.
    pub id: String,

    /// Account name.
    pub username: String,

    /// Roles carried over from the user record.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Application the request authenticated against.
    pub application_id: String,
}

impl Principal {
    /// Builds a principal for `user` authenticated via `application_id`.
    #[must_use]
    pub fn from_user(user: &User, application_id: impl Into<String>) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            roles: user.roles.clone(),
            application_id: application_id.into(),
        }
    }
}

/// Decoded `(username, secret)` pair taken from a request header.
///
/// Built per request and dropped afterwards. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialEnvelope {
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for CredentialEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialEnvelope")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}
