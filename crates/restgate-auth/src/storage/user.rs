//! User storage trait.
//!
//! The gateway treats the user store as a black box: it looks accounts up by
//! name while validating credentials and re-loads them by id once validation
//! succeeds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthResult;

fn default_active() -> bool {
    true
}

// =============================================================================
// User Type
// =============================================================================

/// A user account known to the user store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier for the user.
    #[serde(default = "generate_user_id")]
    pub id: String,

    /// Account name carried in credential envelopes.
    pub username: String,

    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Roles propagated to the principal.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Whether the account is active. Inactive accounts are blocked.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn generate_user_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl User {
    /// Creates a new active user with a generated UUID.
    #[must_use]
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: generate_user_id(),
            username: username.into(),
            email: None,
            roles: Vec::new(),
            active: true,
        }
    }

    /// Creates a new user builder.
    #[must_use]
    pub fn builder(username: impl Into<String>) -> UserBuilder {
        UserBuilder::new(username)
    }

    /// Returns `true` if the user account is blocked.
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.active
    }
}

// =============================================================================
// User Builder
// =============================================================================

/// Builder for creating `User` instances.
pub struct UserBuilder {
    user: User,
}

impl UserBuilder {
    fn new(username: impl Into<String>) -> Self {
        Self {
            user: User::new(username),
        }
    }

    /// Sets the user ID.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.user.id = id.into();
        self
    }

    /// Sets the email address.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.user.email = Some(email.into());
        self
    }

    /// Adds a role to the user.
    #[must_use]
    pub fn add_role(mut self, role: impl Into<String>) -> Self {
        self.user.roles.push(role.into());
        self
    }

    /// Sets whether the user is active.
    #[must_use]
    pub fn active(mut self, active: bool) -> Self {
        self.user.active = active;
        self
    }

    /// Builds the user.
    #[must_use]
    pub fn build(self) -> User {
        self.user
    }
}

// =============================================================================
// User Storage Trait
// =============================================================================

/// Lookup operations the gateway needs from a user store.
#[async_trait]
pub trait UserStorage: Send + Sync {
    /// Find a user by their unique ID.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_id(&self, user_id: &str) -> AuthResult<Option<User>>;

    /// Find a user by their username.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage operation fails.
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let user = User::builder("alice")
            .id("u-1")
            .email("alice@example.com")
            .add_role("editor")
            .active(false)
            .build();

        assert_eq!(user.id, "u-1");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
        assert_eq!(user.roles, vec!["editor".to_string()]);
        assert!(user.is_blocked());
    }

    #[test]
    fn test_deserialize_defaults() {
        let user: User = serde_json::from_value(serde_json::json!({ "username": "bob" })).unwrap();
        assert!(!user.id.is_empty());
        assert!(!user.is_blocked());
        assert!(user.roles.is_empty());
    }
}
