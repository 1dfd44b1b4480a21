//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A list row carrying joined display names, where listings need them
//! - A validated create DTO for inserts
//! - An update DTO (all `Option` fields) for `COALESCE` patches
//! - A `Deserialize` filter struct for list query strings

pub mod backlog;
pub mod catalog;
pub mod dashboard;
pub mod equipment;
pub mod mechanic;
pub mod oil_analysis;
pub mod part;
pub mod preventive_plan;
pub mod stock_movement;
pub mod tire;
pub mod user;
pub mod work_order;
