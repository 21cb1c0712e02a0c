//! Authentication audit log table.
//!
//! One row per authentication attempt. Rows are only ever inserted or
//! deleted wholesale; there is no update path.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use tracing::instrument;

use restgate_auth::audit::{AuditFilter, AuditLogEntry, AuditStats, AuditStatus, NewAuditEntry};

use crate::{PgPool, StorageError, StorageResult};

/// Name of the audit table.
pub const AUDIT_TABLE: &str = "rest_api_authentication_logs";

/// Shared WHERE clause for filtered reads.
///
/// Binds: `$1` username pattern, `$2` client ip pattern, `$3` authentication
/// method, `$4` status, `$5` response code, `$6` / `$7` inclusive timestamp
/// bounds. A NULL bind disables its condition.
macro_rules! filter_clause {
    () => {
        r#"
        WHERE ($1::text IS NULL OR username ILIKE '%' || $1 || '%' ESCAPE '\')
          AND ($2::text IS NULL OR client_ip ILIKE '%' || $2 || '%' ESCAPE '\')
          AND ($3::text IS NULL OR authentication_method = $3)
          AND ($4::text IS NULL OR status = $4)
          AND ($5::int IS NULL OR response_code = $5)
          AND ($6::bigint IS NULL OR timestamp >= $6)
          AND ($7::bigint IS NULL OR timestamp <= $7)
        "#
    };
}

type AuditRow = (
    i64,
    i64,
    String,
    Option<String>,
    String,
    String,
    String,
    String,
    i32,
    Option<String>,
    Option<String>,
);

/// Bind values derived from an [`AuditFilter`].
struct FilterBinds {
    username: Option<String>,
    client_ip: Option<String>,
    authentication_method: Option<String>,
    status: Option<&'static str>,
    response_code: Option<i32>,
    from: Option<i64>,
    to: Option<i64>,
}

impl FilterBinds {
    fn new(filter: &AuditFilter) -> Self {
        let (from, to) = filter.timestamp_range();
        Self {
            username: filter.username.as_deref().map(escape_like),
            client_ip: filter.client_ip.as_deref().map(escape_like),
            authentication_method: filter.authentication_method.clone(),
            status: filter.status.map(|status| status.as_str()),
            response_code: filter.response_code.map(i32::from),
            from,
            to,
        }
    }
}

/// Audit table operations.
pub struct AuditLogTable<'a> {
    pool: &'a PgPool,
}

impl<'a> AuditLogTable<'a> {
    /// Create a new audit table handle with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Returns `true` if the table exists in the current search path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn exists(&self) -> StorageResult<bool> {
        let exists: bool = query_scalar("SELECT to_regclass($1) IS NOT NULL")
            .bind(AUDIT_TABLE)
            .fetch_one(self.pool)
            .await?;
        Ok(exists)
    }

    /// Create the table and its indexes if missing.
    ///
    /// # Errors
    ///
    /// Returns an error if any DDL statement fails.
    #[instrument(skip(self))]
    pub async fn create(&self) -> StorageResult<()> {
        query(
            r#"
            CREATE TABLE IF NOT EXISTS rest_api_authentication_logs (
                id BIGSERIAL PRIMARY KEY,
                timestamp BIGINT NOT NULL,
                username VARCHAR(255) NOT NULL,
                client_ip VARCHAR(45),
                request_method VARCHAR(10) NOT NULL,
                endpoint_url TEXT NOT NULL,
                authentication_method VARCHAR(50) NOT NULL,
                status VARCHAR(32) NOT NULL,
                response_code INT NOT NULL,
                error_message TEXT,
                user_agent TEXT
            )
            "#,
        )
        .execute(self.pool)
        .await?;

        for statement in [
            "CREATE INDEX IF NOT EXISTS rest_api_authentication_logs_timestamp_idx ON rest_api_authentication_logs (timestamp)",
            "CREATE INDEX IF NOT EXISTS rest_api_authentication_logs_username_idx ON rest_api_authentication_logs (username)",
            "CREATE INDEX IF NOT EXISTS rest_api_authentication_logs_status_idx ON rest_api_authentication_logs (status)",
        ] {
            query(statement).execute(self.pool).await?;
        }

        tracing::info!(table = AUDIT_TABLE, "Audit table ready");
        Ok(())
    }

    /// Insert an entry and return its id.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    #[instrument(skip(self, entry), fields(username = %entry.username, status = %entry.status))]
    pub async fn insert(&self, entry: &NewAuditEntry) -> StorageResult<i64> {
        let id: i64 = query_scalar(
            r#"
            INSERT INTO rest_api_authentication_logs (
                timestamp, username, client_ip, request_method, endpoint_url,
                authentication_method, status, response_code, error_message, user_agent
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(entry.timestamp)
        .bind(&entry.username)
        .bind(entry.client_ip.as_deref())
        .bind(&entry.http_method)
        .bind(&entry.endpoint_url)
        .bind(&entry.authentication_method)
        .bind(entry.status.as_str())
        .bind(i32::from(entry.response_code))
        .bind(entry.error_message.as_deref())
        .bind(entry.user_agent.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Fetch a page of entries, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row cannot be mapped.
    #[instrument(skip(self))]
    pub async fn query(
        &self,
        filter: &AuditFilter,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<AuditLogEntry>> {
        let limit = i64::try_from(limit)
            .map_err(|_| StorageError::invalid_input(format!("limit out of range: {limit}")))?;
        let offset = i64::try_from(offset)
            .map_err(|_| StorageError::invalid_input(format!("offset out of range: {offset}")))?;
        let binds = FilterBinds::new(filter);

        let rows: Vec<AuditRow> = query_as(concat!(
            r#"
            SELECT id, timestamp, username, client_ip, request_method, endpoint_url,
                   authentication_method, status, response_code, error_message, user_agent
            FROM rest_api_authentication_logs
            "#,
            filter_clause!(),
            r#"
            ORDER BY timestamp DESC, id DESC
            LIMIT $8 OFFSET $9
            "#
        ))
        .bind(binds.username)
        .bind(binds.client_ip)
        .bind(binds.authentication_method)
        .bind(binds.status)
        .bind(binds.response_code)
        .bind(binds.from)
        .bind(binds.to)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    /// Count entries matching a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn count(&self, filter: &AuditFilter) -> StorageResult<u64> {
        let binds = FilterBinds::new(filter);

        let count: i64 = query_scalar(concat!(
            "SELECT COUNT(*) FROM rest_api_authentication_logs",
            filter_clause!()
        ))
        .bind(binds.username)
        .bind(binds.client_ip)
        .bind(binds.authentication_method)
        .bind(binds.status)
        .bind(binds.response_code)
        .bind(binds.from)
        .bind(binds.to)
        .fetch_one(self.pool)
        .await?;

        Ok(count.max(0).unsigned_abs())
    }

    /// Delete every entry.
    ///
    /// Returns the number of deleted rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the database delete fails.
    #[instrument(skip(self))]
    pub async fn delete_all(&self) -> StorageResult<u64> {
        let result = query("DELETE FROM rest_api_authentication_logs")
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Summarize the table relative to `now` (unix seconds).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    #[instrument(skip(self))]
    pub async fn stats(&self, now: i64) -> StorageResult<AuditStats> {
        let (total, oldest, newest, older_30, older_7, newer_7, newer_1): (
            i64,
            Option<i64>,
            Option<i64>,
            i64,
            i64,
            i64,
            i64,
        ) = query_as(
            r#"
            SELECT COUNT(*),
                   MIN(timestamp),
                   MAX(timestamp),
                   COUNT(*) FILTER (WHERE timestamp < $1),
                   COUNT(*) FILTER (WHERE timestamp < $2),
                   COUNT(*) FILTER (WHERE timestamp >= $2),
                   COUNT(*) FILTER (WHERE timestamp >= $3)
            FROM rest_api_authentication_logs
            "#,
        )
        .bind(AuditStats::cutoff_30_days(now))
        .bind(AuditStats::cutoff_7_days(now))
        .bind(AuditStats::cutoff_1_day(now))
        .fetch_one(self.pool)
        .await?;

        Ok(AuditStats {
            total: total.unsigned_abs(),
            oldest_timestamp: oldest,
            newest_timestamp: newest,
            older_than_30_days: older_30.unsigned_abs(),
            older_than_7_days: older_7.unsigned_abs(),
            newer_than_7_days: newer_7.unsigned_abs(),
            newer_than_1_day: newer_1.unsigned_abs(),
        })
    }
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn entry_from_row(row: AuditRow) -> StorageResult<AuditLogEntry> {
    let (
        id,
        timestamp,
        username,
        client_ip,
        http_method,
        endpoint_url,
        authentication_method,
        status,
        response_code,
        error_message,
        user_agent,
    ) = row;

    let status: AuditStatus = status.parse().map_err(StorageError::invalid_row)?;
    let response_code = u16::try_from(response_code).map_err(|_| {
        StorageError::invalid_row(format!("response code out of range: {response_code}"))
    })?;

    Ok(AuditLogEntry {
        id,
        timestamp,
        username,
        client_ip,
        http_method,
        endpoint_url,
        authentication_method,
        status,
        response_code,
        error_message,
        user_agent,
    })
}
