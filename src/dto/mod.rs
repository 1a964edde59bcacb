use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// Admin API payloads.
pub mod admin;
/// Health check payloads.
pub mod health;
/// Public API payloads.
pub mod public;
/// Server-sent event payloads.
pub mod sse;
/// Field validators shared by request payloads.
pub mod validation;

/// Format a timestamp as RFC 3339 in UTC.
pub(crate) fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp such as `2026-06-11T18:00:00Z`.
pub fn parse_timestamp(raw: &str) -> Result<SystemTime, time::error::Parse> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).map(SystemTime::from)
}
