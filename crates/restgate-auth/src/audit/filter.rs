//! Audit log query filters.

use serde::{Deserialize, Deserializer, Serialize};
use time::macros::format_description;
use time::{Date, Time};

use super::entry::{AuditLogEntry, AuditStatus};

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Filters for audit queries. Every field is optional; unset fields match
/// everything.
///
/// - `username`, `client_ip`: case-insensitive substring match
/// - `authentication_method`, `status`, `response_code`: exact match
/// - `date_from`, `date_to`: inclusive UTC day range; `date_to` extends to
///   23:59:59 of that day
///
/// Blank strings (as sent by HTML filter forms) are treated as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFilter {
    #[serde(default, deserialize_with = "blank_as_none")]
    pub username: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub client_ip: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub authentication_method: Option<String>,
    #[serde(default, deserialize_with = "parse_blank_as_none")]
    pub status: Option<AuditStatus>,
    #[serde(default, deserialize_with = "parse_blank_as_none")]
    pub response_code: Option<u16>,
    #[serde(default, deserialize_with = "date_blank_as_none")]
    pub date_from: Option<Date>,
    #[serde(default, deserialize_with = "date_blank_as_none")]
    pub date_to: Option<Date>,
}

impl AuditFilter {
    /// Returns `true` when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Inclusive unix-second bounds derived from `date_from` / `date_to`.
    #[must_use]
    pub fn timestamp_range(&self) -> (Option<i64>, Option<i64>) {
        let from = self.date_from.map(start_of_day);
        let to = self
            .date_to
            .map(|date| start_of_day(date) + SECONDS_PER_DAY - 1);
        (from, to)
    }

    /// Evaluates the filter against a stored entry.
    #[must_use]
    pub fn matches(&self, entry: &AuditLogEntry) -> bool {
        if let Some(username) = &self.username
            && !contains_ignore_case(&entry.username, username)
        {
            return false;
        }
        if let Some(ip) = &self.client_ip
            && !entry
                .client_ip
                .as_deref()
                .is_some_and(|value| contains_ignore_case(value, ip))
        {
            return false;
        }
        if let Some(method) = &self.authentication_method
            && entry.authentication_method != *method
        {
            return false;
        }
        if let Some(status) = self.status
            && entry.status != status
        {
            return false;
        }
        if let Some(code) = self.response_code
            && entry.response_code != code
        {
            return false;
        }

        let (from, to) = self.timestamp_range();
        if from.is_some_and(|from| entry.timestamp < from) {
            return false;
        }
        if to.is_some_and(|to| entry.timestamp > to) {
            return false;
        }
        true
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), format_description!("[year]-[month]-[day]"))
}

fn start_of_day(date: Date) -> i64 {
    date.with_time(Time::MIDNIGHT).assume_utc().unix_timestamp()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty()))
}

fn parse_blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;

    match blank_as_none(deserializer)? {
        Some(value) => value.parse().map(Some).map_err(D::Error::custom),
        None => Ok(None),
    }
}

fn date_blank_as_none<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match blank_as_none(deserializer)? {
        Some(value) => parse_date(&value).map(Some).map_err(|e| {
            D::Error::custom(format!("invalid date '{value}', expected YYYY-MM-DD: {e}"))
        }),
        None => Ok(None),
    }
}
