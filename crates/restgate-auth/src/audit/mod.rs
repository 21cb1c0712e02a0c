//! Authentication audit logging.
//!
//! Every decision the gateway makes about a gated request is appended to the
//! audit log: successes, structured rejections and generic access denials.
//! The log is insert-only; the only way to remove entries is a full purge.
//!
//! Recording is best effort. A failing audit store is reported through
//! `tracing` and never changes the authentication outcome.

pub mod entry;
pub mod export;
pub mod filter;

use std::io::Write;
use std::sync::Arc;

pub use entry::{ANONYMOUS, AuditLogEntry, AuditStats, AuditStatus, NewAuditEntry, UNKNOWN_METHOD};
pub use export::{CSV_HEADER, DEFAULT_EXPORT_LIMIT, export_filename, write_csv};
pub use filter::AuditFilter;

use crate::clock::{Clock, SystemClock};
use crate::storage::AuditStorage;
use crate::{AuthError, AuthResult};

/// Default page size for audit listings.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Authentication method filter options as `(value, label)`.
pub const METHOD_OPTIONS: [(&str, &str); 5] = [
    ("basic_auth", "Basic Authentication"),
    ("api_key", "API Key"),
    ("oauth", "OAuth/Access Token"),
    ("jwt", "JWT"),
    ("external_oauth", "External Identity Provider"),
];

/// Response code filter options as `(code, label)`.
pub const RESPONSE_CODE_OPTIONS: [(u16, &str); 8] = [
    (200, "200 - OK"),
    (201, "201 - Created"),
    (400, "400 - Bad Request"),
    (401, "401 - Unauthorized"),
    (403, "403 - Forbidden"),
    (404, "404 - Not Found"),
    (429, "429 - Too Many Requests"),
    (500, "500 - Internal Server Error"),
];

/// Status filter options as `(value, label)`.
pub fn status_options() -> impl Iterator<Item = (&'static str, &'static str)> {
    AuditStatus::ALL.into_iter().map(|s| (s.as_str(), s.label()))
}

/// Audit logger over a pluggable [`AuditStorage`].
#[derive(Clone)]
pub struct AuditLogger {
    storage: Arc<dyn AuditStorage>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for AuditLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditLogger").finish_non_exhaustive()
    }
}

impl AuditLogger {
    /// Creates a logger stamping entries with the system clock.
    #[must_use]
    pub fn new(storage: Arc<dyn AuditStorage>) -> Self {
        Self::with_clock(storage, Arc::new(SystemClock))
    }

    #[must_use]
    pub fn with_clock(storage: Arc<dyn AuditStorage>, clock: Arc<dyn Clock>) -> Self {
        Self { storage, clock }
    }

    /// Current time in unix seconds, as stamped on new entries.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp()
    }

    /// Clock used for timestamps.
    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Makes sure the backing schema exists, creating it if needed.
    ///
    /// Returns `false` if the schema is missing and could not be created.
    pub async fn ensure_store_exists(&self) -> bool {
        match self.storage.schema_exists().await {
            Ok(true) => true,
            Ok(false) => {
                tracing::warn!("Audit log store missing, creating it");
                match self.storage.create_schema().await {
                    Ok(()) => {
                        tracing::info!("Audit log store created");
                        true
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to create audit log store");
                        false
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to check audit log store");
                false
            }
        }
    }

    /// Appends an entry. Failures are logged and swallowed.
    pub async fn record(&self, entry: NewAuditEntry) {
        if !self.ensure_store_exists().await {
            tracing::error!(
                endpoint = %entry.endpoint_url,
                status = %entry.status,
                "Cannot record authentication attempt: audit store unavailable"
            );
            return;
        }

        match self.storage.insert(&entry).await {
            Ok(id) => tracing::debug!(
                audit_id = id,
                username = %entry.username,
                status = %entry.status,
                response_code = entry.response_code,
                "Authentication attempt recorded"
            ),
            Err(e) => tracing::error!(
                error = %e,
                endpoint = %entry.endpoint_url,
                "Failed to record authentication attempt"
            ),
        }
    }

    /// Returns entries matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store is unavailable or the query fails.
    pub async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
        offset: usize,
    ) -> AuthResult<Vec<AuditLogEntry>> {
        self.require_store().await?;
        self.storage.query(filter, limit, offset).await
    }

    /// Counts entries matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store is unavailable or the query fails.
    pub async fn count(&self, filter: &AuditFilter) -> AuthResult<u64> {
        self.require_store().await?;
        self.storage.count(filter).await
    }

    /// Deletes every entry and returns how many were removed.
    ///
    /// Returns `Ok(0)` without touching the store if it could not be created.
    ///
    /// # Errors
    ///
    /// Propagates storage errors from counting or deleting.
    pub async fn purge_all(&self) -> AuthResult<u64> {
        if !self.ensure_store_exists().await {
            tracing::error!("Cannot delete audit entries: audit store unavailable");
            return Ok(0);
        }

        let total = self.storage.count(&AuditFilter::default()).await?;
        if total == 0 {
            tracing::info!("No audit entries to delete");
            return Ok(0);
        }

        tracing::info!(count = total, "Deleting all audit entries");
        match self.storage.delete_all().await {
            Ok(deleted) => {
                tracing::info!(count = deleted, "Audit entries deleted");
                Ok(deleted)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to delete audit entries");
                Err(e)
            }
        }
    }

    /// Summary of the store contents relative to now.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the store is unavailable or the query fails.
    pub async fn stats(&self) -> AuthResult<AuditStats> {
        self.require_store().await?;
        self.storage.stats(self.now()).await
    }

    /// Writes up to `limit` entries matching `filter` as CSV. Returns the
    /// number of rows written.
    ///
    /// # Errors
    ///
    /// Returns a storage error if querying or writing fails.
    pub async fn export_csv<W: Write>(
        &self,
        filter: &AuditFilter,
        limit: usize,
        output: W,
    ) -> AuthResult<usize> {
        let entries = self.query(filter, limit, 0).await?;
        write_csv(&entries, output)
    }

    async fn require_store(&self) -> AuthResult<()> {
        if self.ensure_store_exists().await {
            Ok(())
        } else {
            Err(AuthError::storage("audit log store is unavailable"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::storage::MemoryAuditStorage;
    use async_trait::async_trait;

    const NOW: i64 = 1_709_285_400;

    fn logger() -> AuditLogger {
        AuditLogger::with_clock(
            Arc::new(MemoryAuditStorage::new()),
            Arc::new(FixedClock::new(NOW)),
        )
    }

    fn new_entry(timestamp: i64, status: AuditStatus, code: u16) -> NewAuditEntry {
        NewAuditEntry {
            timestamp,
            username: ANONYMOUS.to_string(),
            client_ip: Some("192.0.2.10".to_string()),
            http_method: "GET".to_string(),
            endpoint_url: "/jsonapi/node".to_string(),
            authentication_method: "basic_auth".to_string(),
            status,
            response_code: code,
            error_message: None,
            user_agent: Some("curl/8.0".to_string()),
        }
    }

    /// Store whose schema can never be created.
    struct UnavailableStorage;

    #[async_trait]
    impl AuditStorage for UnavailableStorage {
        async fn schema_exists(&self) -> AuthResult<bool> {
            Ok(false)
        }
        async fn create_schema(&self) -> AuthResult<()> {
            Err(AuthError::storage("permission denied"))
        }
        async fn insert(&self, _: &NewAuditEntry) -> AuthResult<i64> {
            panic!("insert without schema")
        }
        async fn query(&self, _: &AuditFilter, _: usize, _: usize) -> AuthResult<Vec<AuditLogEntry>> {
            panic!("query without schema")
        }
        async fn count(&self, _: &AuditFilter) -> AuthResult<u64> {
            panic!("count without schema")
        }
        async fn delete_all(&self) -> AuthResult<u64> {
            panic!("delete without schema")
        }
        async fn stats(&self, _: i64) -> AuthResult<AuditStats> {
            panic!("stats without schema")
        }
    }

    #[tokio::test]
    async fn test_record_creates_store_lazily() {
        let storage = Arc::new(MemoryAuditStorage::new());
        let logger = AuditLogger::new(storage.clone());
        assert!(!storage.schema_exists().await.unwrap());

        logger.record(new_entry(NOW, AuditStatus::Success, 200)).await;

        assert!(storage.schema_exists().await.unwrap());
        assert_eq!(logger.count(&AuditFilter::default()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_record_swallows_unavailable_store() {
        let logger = AuditLogger::new(Arc::new(UnavailableStorage));
        logger.record(new_entry(NOW, AuditStatus::Success, 200)).await;
        assert_eq!(logger.purge_all().await.unwrap(), 0);
        assert!(logger.count(&AuditFilter::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_purge_returns_pre_purge_total() {
        let logger = logger();
        for i in 0..3 {
            logger.record(new_entry(NOW - i, AuditStatus::Failure, 401)).await;
        }

        let total = logger.count(&AuditFilter::default()).await.unwrap();
        assert_eq!(logger.purge_all().await.unwrap(), total);
        assert_eq!(logger.count(&AuditFilter::default()).await.unwrap(), 0);
        assert_eq!(logger.purge_all().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_query_filters_and_orders() {
        let logger = logger();
        logger.record(new_entry(NOW - 20, AuditStatus::Success, 200)).await;
        logger.record(new_entry(NOW - 10, AuditStatus::Failure, 401)).await;
        logger.record(new_entry(NOW, AuditStatus::Failure, 403)).await;

        let failures = AuditFilter {
            status: Some(AuditStatus::Failure),
            ..AuditFilter::default()
        };
        let rows = logger.query(&failures, DEFAULT_PAGE_SIZE, 0).await.unwrap();
        let codes: Vec<u16> = rows.iter().map(|r| r.response_code).collect();
        assert_eq!(codes, vec![403, 401]);
        assert_eq!(logger.count(&failures).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_stats_use_clock() {
        let logger = logger();
        logger.record(new_entry(NOW - 31 * 86_400, AuditStatus::Success, 200)).await;
        logger.record(new_entry(NOW - 60, AuditStatus::Success, 200)).await;

        let stats = logger.stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.older_than_30_days, 1);
        assert_eq!(stats.newer_than_1_day, 1);
    }

    #[tokio::test]
    async fn test_export_csv_respects_limit() {
        let logger = logger();
        for i in 0..5 {
            logger.record(new_entry(NOW - i, AuditStatus::Success, 200)).await;
        }

        let mut buffer = Vec::new();
        let rows = logger
            .export_csv(&AuditFilter::default(), 3, &mut buffer)
            .await
            .unwrap();
        assert_eq!(rows, 3);
        assert_eq!(String::from_utf8(buffer).unwrap().lines().count(), 4);
    }

    #[test]
    fn test_option_lists() {
        assert_eq!(METHOD_OPTIONS[0].0, "basic_auth");
        assert_eq!(status_options().count(), 7);
        assert!(RESPONSE_CODE_OPTIONS.iter().any(|(code, _)| *code == 429));
    }
}
