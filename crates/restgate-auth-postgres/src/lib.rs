//! PostgreSQL storage backend for restgate-auth
//!
//! Persists the authentication audit log in the
//! `rest_api_authentication_logs` table. The table and its indexes are
//! created on demand by [`AuditLogTable::create`].
//!
//! # Example
//!
//! ```ignore
//! use restgate_auth::AuditLogger;
//! use restgate_auth_postgres::PostgresAuditStorage;
//!
//! let storage = PostgresAuditStorage::connect("postgres://localhost/restgate", 5).await?;
//! let logger = AuditLogger::new(std::sync::Arc::new(storage));
//! logger.ensure_store_exists().await;
//! ```

pub mod audit;
pub mod storage_adapters;

use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

use restgate_auth::AuthError;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

pub use audit::{AUDIT_TABLE, AuditLogTable};
pub use storage_adapters::PostgresAuditStorage;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during audit storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx_core::Error),

    /// A stored row could not be mapped back to an entry.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// Invalid input data.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StorageError {
    /// Create an `InvalidRow` error.
    #[must_use]
    pub fn invalid_row(message: impl Into<String>) -> Self {
        Self::InvalidRow(message.into())
    }

    /// Create an `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Returns `true` if this is a database error.
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database(_))
    }

    /// Returns `true` if this is an invalid input error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Returns `true` if this is a client error (4xx equivalent).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Returns `true` if this is a server error (5xx equivalent).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::InvalidRow(_))
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidInput(message) => AuthError::invalid_input(message),
            other => AuthError::storage(other.to_string()),
        }
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

// =============================================================================
// Tests
// =============================================================================
