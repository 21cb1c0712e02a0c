//! Error types for the authentication gateway.
//!
//! Two families live here:
//!
//! - [`AuthError`] covers operational failures (storage, configuration,
//!   missing registry entries) raised by the registry, stores and admin APIs.
//! - [`ErrorCode`] and [`ApiError`] form the externally visible rejection
//!   taxonomy written to clients when a gated request is denied.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// Errors that can occur while operating the gateway and its stores.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The requested application is not registered.
    #[error("Application not found: {id}")]
    ApplicationNotFound {
        /// The application identifier that was looked up.
        id: String,
    },

    /// The input supplied to an administrative operation is invalid.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what is wrong with the input.
        message: String,
    },

    /// An error occurred while storing or retrieving data.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage error.
        message: String,
    },

    /// The gateway configuration is invalid.
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `ApplicationNotFound` error.
    #[must_use]
    pub fn application_not_found(id: impl Into<String>) -> Self {
        Self::ApplicationNotFound { id: id.into() }
    }

    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Configuration` error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::ApplicationNotFound { .. } | Self::InvalidInput { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApplicationNotFound { .. } | Self::InvalidInput { .. } => ErrorCategory::Validation,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Configuration { .. } => ErrorCategory::Configuration,
        }
    }
}

impl From<ConfigError> for AuthError {
    fn from(err: ConfigError) -> Self {
        Self::configuration(err.to_string())
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(err.to_string())
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("serialization failed: {err}"))
    }
}

/// Categories of gateway errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Request or input validation errors.
    Validation,
    /// Infrastructure/storage errors.
    Infrastructure,
    /// Configuration errors.
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Configuration => write!(f, "configuration"),
        }
    }
}

// =============================================================================
// Rejection taxonomy
// =============================================================================

/// Machine-readable rejection codes returned to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// No application selector header and no usable default application.
    MissingHeader,
    /// The selector does not match a registered application.
    InvalidApplicationId,
    /// The `Authorization` header is absent.
    MissingAuthorizationHeader,
    /// The `api-key` header is absent.
    MissingApiKeyHeader,
    /// The `Authorization` header uses a scheme other than Basic.
    InvalidAuthorizationHeaderType,
    /// The Basic payload is not base64 or lacks a `:` separator.
    InvalidAuthorizationHeader,
    /// The `api-key` payload is not base64 or lacks a `:` separator.
    InvalidApiKeyFormat,
    /// The username does not exist.
    UserDoesNotExist,
    /// The account is blocked.
    UserBlocked,
    /// The supplied secret does not match.
    InvalidApiKey,
}

impl ErrorCode {
    /// HTTP status code paired with this rejection.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::MissingHeader | Self::InvalidApplicationId => 400,
            Self::MissingAuthorizationHeader
            | Self::MissingApiKeyHeader
            | Self::InvalidAuthorizationHeaderType
            | Self::InvalidAuthorizationHeader
            | Self::InvalidApiKeyFormat
            | Self::InvalidApiKey => 401,
            Self::UserBlocked => 403,
            Self::UserDoesNotExist => 404,
        }
    }

    /// Human-readable description sent as `error_description`.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::MissingHeader => {
                "Missing required unique header. It should contain the application ID, or a default application must be configured."
            }
            Self::InvalidApplicationId => {
                "The provided application ID is not valid or not configured."
            }
            Self::MissingAuthorizationHeader => "Authorization header not received",
            Self::MissingApiKeyHeader => "API key header is missing.",
            Self::InvalidAuthorizationHeaderType => "Authorization header must be of type Basic.",
            Self::InvalidAuthorizationHeader => "Authorization header format is invalid.",
            Self::InvalidApiKeyFormat => "API key format is invalid.",
            Self::UserDoesNotExist => "The user does not exist.",
            Self::UserBlocked => "The user is blocked or inactive.",
            Self::InvalidApiKey => "Sorry, you are using an invalid API Key.",
        }
    }

    /// Wire representation, e.g. `MISSING_HEADER`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingHeader => "MISSING_HEADER",
            Self::InvalidApplicationId => "INVALID_APPLICATION_ID",
            Self::MissingAuthorizationHeader => "MISSING_AUTHORIZATION_HEADER",
            Self::MissingApiKeyHeader => "MISSING_API_KEY_HEADER",
            Self::InvalidAuthorizationHeaderType => "INVALID_AUTHORIZATION_HEADER_TYPE",
            Self::InvalidAuthorizationHeader => "INVALID_AUTHORIZATION_HEADER",
            Self::InvalidApiKeyFormat => "INVALID_API_KEY_FORMAT",
            Self::UserDoesNotExist => "USER_DOES_NOT_EXIST",
            Self::UserBlocked => "USER_BLOCKED",
            Self::InvalidApiKey => "INVALID_API_KEY",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed `status` discriminator of an error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Error,
}

/// Structured rejection body: `{status, http_code, error, error_description}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    pub status: ApiStatus,
    pub http_code: u16,
    pub error: ErrorCode,
    pub error_description: String,
}

impl ApiError {
    /// Builds the rejection for `code` with its standard description.
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self::with_description(code, code.description())
    }

    /// Builds the rejection for `code` with a custom description.
    #[must_use]
    pub fn with_description(code: ErrorCode, description: impl Into<String>) -> Self {
        Self {
            status: ApiStatus::Error,
            http_code: code.http_status(),
            error: code,
            error_description: description.into(),
        }
    }

    /// Returns `true` when the description carries something to show.
    #[must_use]
    pub fn has_description(&self) -> bool {
        !self.error_description.trim().is_empty()
    }
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Message recorded in the audit log for the generic access-denied path.
pub const ACCESS_DENIED_MESSAGE: &str = "Access denied";

/// Description returned to clients for the generic access-denied path.
pub const INVALID_CONSUMER_ORIGIN: &str = "Invalid consumer origin.";

/// Why a gated request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Structured rejection written to the client as-is.
    Api(ApiError),
    /// Rejection without a usable description. Audited as 403 and answered
    /// with a 401 "Invalid consumer origin." challenge.
    AccessDenied,
}

impl Rejection {
    /// Status recorded in the audit log.
    #[must_use]
    pub fn audit_code(&self) -> u16 {
        match self {
            Self::Api(err) => err.http_code,
            Self::AccessDenied => 403,
        }
    }

    /// Message recorded in the audit log.
    #[must_use]
    pub fn audit_message(&self) -> &str {
        match self {
            Self::Api(err) => &err.error_description,
            Self::AccessDenied => ACCESS_DENIED_MESSAGE,
        }
    }
}

impl From<ApiError> for Rejection {
    fn from(err: ApiError) -> Self {
        if err.has_description() {
            Self::Api(err)
        } else {
            Self::AccessDenied
        }
    }
}

impl From<ErrorCode> for Rejection {
    fn from(code: ErrorCode) -> Self {
        Self::Api(ApiError::new(code))
    }
}
