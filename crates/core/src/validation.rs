//! Field-level validators shared by every resource.
//!
//! Handlers call these before touching the database so that malformed input
//! is rejected with a 400 and a message naming the offending field.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use validator::ValidateEmail;

use crate::error::CoreError;
use crate::types::Date;

/// Accepted colour format for maintenance types (`#RRGGBB`).
const HEX_COLOR_PATTERN: &str = r"^#[0-9A-Fa-f]{6}$";

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HEX_COLOR_PATTERN).expect("valid regex"));

/// Date format used on the wire for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Required fields
// ---------------------------------------------------------------------------

/// Return the trimmed value of a required text field.
///
/// Missing, empty, and whitespace-only values are all rejected.
pub fn require_text(field: &str, value: Option<&str>) -> Result<String, CoreError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(CoreError::Validation(format!("Field '{field}' is required"))),
    }
}

/// Unwrap a required non-text field.
pub fn require<T>(field: &str, value: Option<T>) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::Validation(format!("Field '{field}' is required")))
}

/// Normalise an optional text field: trims it and maps blank to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Formats
// ---------------------------------------------------------------------------

/// Parse a `YYYY-MM-DD` date.
pub fn parse_date(field: &str, value: &str) -> Result<Date, CoreError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|_| {
        CoreError::Validation(format!(
            "Field '{field}' must be a date in the format YYYY-MM-DD"
        ))
    })
}

/// Check that `value` is one of `valid`.
pub fn validate_one_of(field: &str, value: &str, valid: &[&str]) -> Result<(), CoreError> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid {field}: '{value}'. Valid values: {}",
            valid.join(", ")
        )))
    }
}

/// Validate an e-mail address.
pub fn validate_email(email: &str) -> Result<(), CoreError> {
    let owned = email.trim().to_string();
    if owned.validate_email() {
        Ok(())
    } else {
        Err(CoreError::Validation(format!("Invalid email address: '{email}'")))
    }
}

/// Validate a `#RRGGBB` colour.
pub fn validate_hex_color(color: &str) -> Result<(), CoreError> {
    if HEX_COLOR_RE.is_match(color) {
        Ok(())
    } else {
        Err(CoreError::Validation(format!(
            "Invalid color '{color}'. Expected format #RRGGBB"
        )))
    }
}

/// Reject negative quantities and amounts.
pub fn validate_non_negative(field: &str, value: f64) -> Result<(), CoreError> {
    if value < 0.0 {
        return Err(CoreError::Validation(format!(
            "Field '{field}' must not be negative"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn require_text_trims_and_rejects_blank() {
        assert_eq!(require_text("name", Some("  Pump ")).unwrap(), "Pump");
        assert_matches!(require_text("name", Some("   ")), Err(CoreError::Validation(_)));
        assert_matches!(require_text("name", None), Err(CoreError::Validation(_)));
    }

    #[test]
    fn optional_text_maps_blank_to_none() {
        assert_eq!(optional_text(Some("  ")), None);
        assert_eq!(optional_text(Some(" a ")), Some("a".to_string()));
        assert_eq!(optional_text(None), None);
    }

    #[test]
    fn parse_date_accepts_iso_dates_only() {
        let date = parse_date("acquired_on", "2024-03-15").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert!(parse_date("acquired_on", "15/03/2024").is_err());
        assert!(parse_date("acquired_on", "2024-13-01").is_err());
    }

    #[test]
    fn one_of_lists_valid_values_in_message() {
        let err = validate_one_of("status", "broken", &["active", "inactive"]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("broken"));
        assert!(msg.contains("active, inactive"));
    }

    #[test]
    fn hex_colors() {
        assert!(validate_hex_color("#1a2B3c").is_ok());
        assert!(validate_hex_color("1a2b3c").is_err());
        assert!(validate_hex_color("#12345").is_err());
    }

    #[test]
    fn emails() {
        assert!(validate_email("maria@example.com").is_ok());
        assert!(validate_email("not-an-email").is_err());
    }

    #[test]
    fn negative_values_rejected() {
        assert!(validate_non_negative("quantity", 0.0).is_ok());
        assert!(validate_non_negative("quantity", -1.0).is_err());
    }
}
