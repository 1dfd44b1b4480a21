//! Domain rules for the maintenance-management service.
//!
//! Everything in this crate is pure: constants, enums with their database
//! string forms, validators, and the calculations behind work-order alerts,
//! stock movements, tire wear, preventive scheduling and backlog scoring.
//! Persistence lives in `cmms-db`, HTTP in `cmms-api`.

pub mod access;
pub mod alert;
pub mod backlog;
pub mod dashboard;
pub mod equipment;
pub mod error;
pub mod import;
pub mod inventory;
pub mod mechanic;
pub mod numeric;
pub mod oil_analysis;
pub mod preventive;
pub mod tire;
pub mod types;
pub mod validation;
pub mod work_order;
