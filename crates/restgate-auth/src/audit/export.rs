//! CSV export of audit entries.

use std::io::Write;

use time::OffsetDateTime;
use time::macros::format_description;

use super::entry::AuditLogEntry;
use crate::{AuthError, AuthResult};

/// Maximum number of rows exported in one file.
pub const DEFAULT_EXPORT_LIMIT: usize = 10_000;

/// Column order of the export.
pub const CSV_HEADER: [&str; 11] = [
    "Timestamp",
    "Date/Time",
    "Username",
    "Client IP",
    "Method",
    "Endpoint",
    "Auth Method",
    "Status",
    "Response Code",
    "Error Message",
    "User Agent",
];

/// Writes `entries` as CSV, header first. Returns the number of data rows.
///
/// # Errors
///
/// Returns a storage error if writing to `output` fails.
pub fn write_csv<W: Write>(entries: &[AuditLogEntry], output: W) -> AuthResult<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(output);

    writer.write_record(CSV_HEADER).map_err(csv_error)?;

    for entry in entries {
        writer
            .write_record([
                entry.timestamp.to_string(),
                format_datetime(entry.timestamp),
                entry.username.clone(),
                entry.client_ip.clone().unwrap_or_default(),
                entry.http_method.clone(),
                entry.endpoint_url.clone(),
                entry.authentication_method.clone(),
                entry.status.to_string(),
                entry.response_code.to_string(),
                entry.error_message.clone().unwrap_or_default(),
                entry.user_agent.clone().unwrap_or_default(),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(entries.len())
}

/// Download file name for an export taken at `now`, e.g.
/// `rest_api_auth_logs_20240301_093000.csv`.
#[must_use]
pub fn export_filename(now: OffsetDateTime) -> String {
    let stamp = now
        .format(format_description!("[year][month][day]_[hour][minute][second]"))
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    format!("rest_api_auth_logs_{stamp}.csv")
}

/// UTC `YYYY-MM-DD HH:MM:SS` rendering of a unix timestamp.
fn format_datetime(timestamp: i64) -> String {
    OffsetDateTime::from_unix_timestamp(timestamp)
        .ok()
        .and_then(|dt| {
            dt.format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .ok()
        })
        .unwrap_or_default()
}

fn csv_error(err: csv::Error) -> AuthError {
    AuthError::storage(format!("CSV export failed: {err}"))
}
