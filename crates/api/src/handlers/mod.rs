pub mod auth;
pub mod backlog;
pub mod catalogs;
pub mod dashboard;
pub mod equipment;
pub mod imports;
pub mod inventory;
pub mod mechanics;
pub mod oil_analyses;
pub mod preventive_plans;
pub mod tires;
pub mod users;
pub mod work_orders;

use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult};

/// Hash a password for storage, mapping hasher failures to a 500.
pub(crate) fn hash_new_password(password: &str) -> AppResult<String> {
    hash_password(password).map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))
}
