//! Audit log storage trait.

use async_trait::async_trait;

use crate::AuthResult;
use crate::audit::{AuditFilter, AuditLogEntry, AuditStats, NewAuditEntry};

/// Storage operations backing the audit logger.
///
/// Implementations must return entries ordered by timestamp descending, with
/// the row id descending as tie-break.
#[async_trait]
pub trait AuditStorage: Send + Sync {
    /// Returns `true` if the underlying schema (table, file) exists.
    async fn schema_exists(&self) -> AuthResult<bool>;

    /// Creates the underlying schema. Must be idempotent.
    async fn create_schema(&self) -> AuthResult<()>;

    /// Appends an entry and returns its assigned id.
    async fn insert(&self, entry: &NewAuditEntry) -> AuthResult<i64>;

    /// Returns a page of entries matching `filter`.
    async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
        offset: usize,
    ) -> AuthResult<Vec<AuditLogEntry>>;

    /// Counts entries matching `filter`.
    async fn count(&self, filter: &AuditFilter) -> AuthResult<u64>;

    /// Deletes every entry and returns how many were removed.
    async fn delete_all(&self) -> AuthResult<u64>;

    /// Summarizes the store relative to `now` (unix seconds).
    async fn stats(&self, now: i64) -> AuthResult<AuditStats>;
}
