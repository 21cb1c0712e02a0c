//! Arc-owning storage adapter for use with the audit logger.
//!
//! Wraps the lifetime-based [`AuditLogTable`] and owns an `Arc<PgPool>`,
//! allowing it to be used as `Arc<dyn AuditStorage>`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;

use restgate_auth::AuthResult;
use restgate_auth::audit::{AuditFilter, AuditLogEntry, AuditStats, NewAuditEntry};
use restgate_auth::storage::AuditStorage;

use crate::audit::AuditLogTable;
use crate::{PgPool, StorageError};

/// PostgreSQL audit storage.
#[derive(Debug, Clone)]
pub struct PostgresAuditStorage {
    pool: Arc<PgPool>,
}

impl PostgresAuditStorage {
    /// Create new storage with an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create new storage backed by a lazily connecting pool.
    ///
    /// No connection is opened until the first query, so an unreachable
    /// database surfaces as per-call storage errors rather than a startup
    /// failure. Each acquire gives up after `acquire_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if `database_url` cannot be parsed.
    pub fn connect_lazy(
        database_url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StorageError> {
        let pool = PoolOptions::<Postgres>::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(database_url)?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn table(&self) -> AuditLogTable<'_> {
        AuditLogTable::new(&self.pool)
    }
}

#[async_trait]
impl AuditStorage for PostgresAuditStorage {
    async fn schema_exists(&self) -> AuthResult<bool> {
        Ok(self.table().exists().await?)
    }

    async fn create_schema(&self) -> AuthResult<()> {
        Ok(self.table().create().await?)
    }

    async fn insert(&self, entry: &NewAuditEntry) -> AuthResult<i64> {
        Ok(self.table().insert(entry).await?)
    }

    async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
        offset: usize,
    ) -> AuthResult<Vec<AuditLogEntry>> {
        Ok(self.table().query(filter, limit, offset).await?)
    }

    async fn count(&self, filter: &AuditFilter) -> AuthResult<u64> {
        Ok(self.table().count(filter).await?)
    }

    async fn delete_all(&self) -> AuthResult<u64> {
        Ok(self.table().delete_all().await?)
    }

    async fn stats(&self, now: i64) -> AuthResult<AuditStats> {
        Ok(self.table().stats(now).await?)
    }
}
