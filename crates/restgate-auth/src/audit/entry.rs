//! Audit log records.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Outcome recorded for an authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStatus {
    Success,
    Failure,
    Blocked,
    InvalidCredentials,
    ExpiredToken,
    IpBlocked,
    AccessDenied,
}

impl AuditStatus {
    /// All statuses, in display order.
    pub const ALL: [AuditStatus; 7] = [
        Self::Success,
        Self::Failure,
        Self::Blocked,
        Self::InvalidCredentials,
        Self::ExpiredToken,
        Self::IpBlocked,
        Self::AccessDenied,
    ];

    /// Stored value, e.g. `invalid_credentials`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Blocked => "blocked",
            Self::InvalidCredentials => "invalid_credentials",
            Self::ExpiredToken => "expired_token",
            Self::IpBlocked => "ip_blocked",
            Self::AccessDenied => "access_denied",
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::Failure => "Failure",
            Self::Blocked => "Blocked",
            Self::InvalidCredentials => "Invalid Credentials",
            Self::ExpiredToken => "Expired Token",
            Self::IpBlocked => "IP Blocked",
            Self::AccessDenied => "Access Denied",
        }
    }
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown audit status: '{s}'"))
    }
}

/// Username recorded when no principal was resolved.
pub const ANONYMOUS: &str = "anonymous";

/// Authentication method recorded before an application is resolved.
pub const UNKNOWN_METHOD: &str = "unknown";

/// A record about to be appended to the audit log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuditEntry {
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub username: String,
    pub client_ip: Option<String>,
    pub http_method: String,
    pub endpoint_url: String,
    pub authentication_method: String,
    pub status: AuditStatus,
    pub response_code: u16,
    pub error_message: Option<String>,
    pub user_agent: Option<String>,
}

impl NewAuditEntry {
    /// Attaches the store-assigned id.
    #[must_use]
    pub fn into_entry(self, id: i64) -> AuditLogEntry {
        AuditLogEntry {
            id,
            timestamp: self.timestamp,
            username: self.username,
            client_ip: self.client_ip,
            http_method: self.http_method,
            endpoint_url: self.endpoint_url,
            authentication_method: self.authentication_method,
            status: self.status,
            response_code: self.response_code,
            error_message: self.error_message,
            user_agent: self.user_agent,
        }
    }
}

/// A persisted audit record. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: i64,
    /// Unix timestamp (seconds).
    pub timestamp: i64,
    pub username: String,
    pub client_ip: Option<String>,
    pub http_method: String,
    pub endpoint_url: String,
    pub authentication_method: String,
    pub status: AuditStatus,
    pub response_code: u16,
    pub error_message: Option<String>,
    pub user_agent: Option<String>,
}

/// Summary of the audit store contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStats {
    pub total: u64,
    pub oldest_timestamp: Option<i64>,
    pub newest_timestamp: Option<i64>,
    pub older_than_30_days: u64,
    pub older_than_7_days: u64,
    pub newer_than_7_days: u64,
    pub newer_than_1_day: u64,
}

const DAY: i64 = 24 * 60 * 60;

impl AuditStats {
    /// Cutoff for `older_than_30_days`.
    #[must_use]
    pub fn cutoff_30_days(now: i64) -> i64 {
        now - 30 * DAY
    }

    /// Cutoff for `older_than_7_days` / `newer_than_7_days`.
    #[must_use]
    pub fn cutoff_7_days(now: i64) -> i64 {
        now - 7 * DAY
    }

    /// Cutoff for `newer_than_1_day`.
    #[must_use]
    pub fn cutoff_1_day(now: i64) -> i64 {
        now - DAY
    }

    /// Builds stats from raw timestamps.
    pub fn tally(timestamps: impl IntoIterator<Item = i64>, now: i64) -> Self {
        let (c30, c7, c1) = (
            Self::cutoff_30_days(now),
            Self::cutoff_7_days(now),
            Self::cutoff_1_day(now),
        );
        let mut stats = Self::default();
        for ts in timestamps {
            stats.total += 1;
            stats.oldest_timestamp = Some(stats.oldest_timestamp.map_or(ts, |o| o.min(ts)));
            stats.newest_timestamp = Some(stats.newest_timestamp.map_or(ts, |n| n.max(ts)));
            if ts < c30 {
                stats.older_than_30_days += 1;
            }
            if ts < c7 {
                stats.older_than_7_days += 1;
            } else {
                stats.newer_than_7_days += 1;
            }
            if ts >= c1 {
                stats.newer_than_1_day += 1;
            }
        }
        stats
    }
}
