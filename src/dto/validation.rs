//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::{dto::parse_timestamp, scoring::score::parse_score};

/// Validates that free-text score input parses into a scoreline.
///
/// Locale digits and dash variants are accepted, so `٢–١` passes.
pub fn validate_score_text(score: &str) -> Result<(), ValidationError> {
    parse_score(score).map(|_| ()).map_err(|err| {
        let mut error = ValidationError::new("score_format");
        error.message = Some(err.to_string().into());
        error
    })
}

/// Validates that a timestamp is RFC 3339.
pub fn validate_timestamp(raw: &str) -> Result<(), ValidationError> {
    parse_timestamp(raw).map(|_| ()).map_err(|_| {
        let mut error = ValidationError::new("timestamp_format");
        error.message = Some(
            format!("`{raw}` is not an RFC 3339 timestamp (e.g. 2026-06-11T18:00:00Z)").into(),
        );
        error
    })
}

/// Validates that a name is not only whitespace.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("blank");
        error.message = Some("must not be blank".into());
        return Err(error);
    }
    Ok(())
}
