//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Resolves the active user behind a JWT Bearer token.
//! - [`rbac`] -- One extractor per access guard (`RequireAdmin`,
//!   `RequireSupervisor`, `RequirePlanner`, `RequireStorekeeper`,
//!   `RequireMechanic`).

pub mod auth;
pub mod rbac;
