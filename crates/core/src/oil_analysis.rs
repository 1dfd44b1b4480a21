//! Oil analysis workflow constants and transition checks.

use crate::error::CoreError;
use crate::validation::validate_one_of;

pub const STATUS_COLLECTED: &str = "collected";
pub const STATUS_IN_ANALYSIS: &str = "in_analysis";
pub const STATUS_COMPLETED: &str = "completed";

pub const VALID_STATUSES: &[&str] = &[STATUS_COLLECTED, STATUS_IN_ANALYSIS, STATUS_COMPLETED];

pub const PRIORITY_LOW: &str = "low";
pub const PRIORITY_NORMAL: &str = "normal";
pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_CRITICAL: &str = "critical";

pub const VALID_PRIORITIES: &[&str] =
    &[PRIORITY_LOW, PRIORITY_NORMAL, PRIORITY_HIGH, PRIORITY_CRITICAL];

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    validate_one_of("analysis status", status, VALID_STATUSES)
}

pub fn validate_priority(priority: &str) -> Result<(), CoreError> {
    validate_one_of("analysis priority", priority, VALID_PRIORITIES)
}

/// A completed analysis cannot be completed again.
pub fn check_can_complete(status: &str) -> Result<(), CoreError> {
    if status == STATUS_COMPLETED {
        return Err(CoreError::Validation(
            "Oil analysis is already completed".to_string(),
        ));
    }
    Ok(())
}

/// Completed analyses are kept as a record.
pub fn check_can_delete(status: &str) -> Result<(), CoreError> {
    if status == STATUS_COMPLETED {
        return Err(CoreError::Validation(
            "Completed oil analyses cannot be deleted".to_string(),
        ));
    }
    Ok(())
}

/// Lab parameters must be a JSON object keyed by parameter name.
pub fn validate_parameters(parameters: &serde_json::Value) -> Result<(), CoreError> {
    if parameters.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation(
            "Field 'parameters' must be a JSON object".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_is_terminal() {
        assert!(check_can_complete("in_analysis").is_ok());
        assert!(check_can_complete("completed").is_err());
        assert!(check_can_delete("collected").is_ok());
        assert!(check_can_delete("completed").is_err());
    }

    #[test]
    fn parameters_must_be_an_object() {
        assert!(validate_parameters(&serde_json::json!({"iron_ppm": 12})).is_ok());
        assert!(validate_parameters(&serde_json::json!([1, 2])).is_err());
    }

    #[test]
    fn priorities() {
        assert!(validate_priority("normal").is_ok());
        assert!(validate_priority("medium").is_err());
    }
}
