//! Equipment status constants.

use crate::error::CoreError;
use crate::validation::validate_one_of;

pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_MAINTENANCE: &str = "maintenance";
pub const STATUS_INACTIVE: &str = "inactive";

pub const VALID_STATUSES: &[&str] = &[STATUS_ACTIVE, STATUS_MAINTENANCE, STATUS_INACTIVE];

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    validate_one_of("equipment status", status, VALID_STATUSES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses() {
        assert!(validate_status("maintenance").is_ok());
        assert!(validate_status("manutencao").is_err());
    }
}
