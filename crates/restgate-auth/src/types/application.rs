//! Application domain types.
//!
//! An application is a named credential tenant: it selects the
//! authentication method used for requests that name it in the `auth-method`
//! header (or for every request when it is the default application).

use serde::{Deserialize, Serialize};

// =============================================================================
// Authentication Method
// =============================================================================

/// Where the API-key strategy reads its credential envelope from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyMode {
    /// `Authorization: Basic base64(username:api_key)`.
    #[default]
    Basic,
    /// `api-key: base64(username:api_key)`.
    Header,
}

/// Authentication method selected by an application.
///
/// Only [`AuthMethod::Basic`] and [`AuthMethod::ApiKey`] are enforced. The
/// remaining variants are accepted in configuration but the gateway lets
/// requests for them through without authenticating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "method")]
pub enum AuthMethod {
    #[serde(rename = "basic")]
    Basic,
    #[serde(rename = "api_key")]
    ApiKey {
        #[serde(default)]
        mode: ApiKeyMode,
    },
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "jwt")]
    Jwt,
    #[serde(rename = "external_oauth")]
    ExternalOAuth,
}

impl AuthMethod {
    /// Name written to the audit log's `authentication_method` column.
    #[must_use]
    pub fn audit_name(&self) -> &'static str {
        match self {
            Self::Basic => "basic_auth",
            Self::ApiKey { .. } => "api_key",
            Self::OAuth => "oauth",
            Self::Jwt => "jwt",
            Self::ExternalOAuth => "external_oauth",
        }
    }

    /// Display label for listings.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Basic => "Basic Authentication",
            Self::ApiKey { .. } => "API Key",
            Self::OAuth => "OAuth/Access Token",
            Self::Jwt => "JWT",
            Self::ExternalOAuth => "External Identity Provider",
        }
    }

    /// Hint telling API consumers which header to send.
    #[must_use]
    pub fn header_hint(&self) -> &'static str {
        match self {
            Self::Basic | Self::ApiKey { mode: ApiKeyMode::Basic } => {
                "Authorization: Basic {base64_encoded_credentials}"
            }
            Self::ApiKey { mode: ApiKeyMode::Header } => "api-key: {base64_encoded_credentials}",
            Self::OAuth | Self::Jwt | Self::ExternalOAuth => "No authentication method selected",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.audit_name())
    }
}

// =============================================================================
// Application
// =============================================================================

/// A configured application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    /// Short opaque identifier sent in the `auth-method` header.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Selected authentication method and its settings.
    #[serde(flatten)]
    pub method: AuthMethod,

    /// Used when a request carries no application selector.
    #[serde(default)]
    pub is_default: bool,

    /// Per-application secret overriding the gateway-wide `api_token`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

impl Application {
    /// Creates a non-default application without a token override.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, method: AuthMethod) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            method,
            is_default: false,
            api_token: None,
        }
    }

    /// Generates a fresh application identifier: the first 8 characters of a v4 UUID.
    #[must_use]
    pub fn generate_id() -> String {
        let uuid = uuid::Uuid::new_v4().simple().to_string();
        uuid[..8].to_string()
    }

    /// Header hint derived from the method.
    #[must_use]
    pub fn header_hint(&self) -> &'static str {
        self.method.header_hint()
    }

    /// Method label derived from the method.
    #[must_use]
    pub fn method_label(&self) -> &'static str {
        self.method.label()
    }

    /// The secret credential envelopes are compared against.
    #[must_use]
    pub fn expected_token<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.api_token.as_deref().or(fallback)
    }
}

/// Fields an administrator supplies when creating or editing an application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDraft {
    pub name: String,
    #[serde(flatten)]
    pub method: AuthMethod,
}

impl ApplicationDraft {
    /// Validates the draft.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("application name cannot be empty".to_string());
        }
        Ok(())
    }
}
