//! Access levels and the permission matrix.
//!
//! Every user carries exactly one access level. Route guards in the API crate
//! map onto the `allows_*` predicates here, and the same matrix is exposed to
//! clients as a [`Permissions`] object so the UI can hide actions up front.

use serde::Serialize;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Level constants
// ---------------------------------------------------------------------------

pub const LEVEL_ADMIN: &str = "admin";
pub const LEVEL_SUPERVISOR: &str = "supervisor";
pub const LEVEL_PLANNER: &str = "planner";
pub const LEVEL_STOREKEEPER: &str = "storekeeper";
pub const LEVEL_MECHANIC: &str = "mechanic";

/// All valid access levels, most privileged first.
pub const VALID_LEVELS: &[&str] = &[
    LEVEL_ADMIN,
    LEVEL_SUPERVISOR,
    LEVEL_PLANNER,
    LEVEL_STOREKEEPER,
    LEVEL_MECHANIC,
];

/// Level assigned when none is given.
pub const DEFAULT_LEVEL: &str = LEVEL_MECHANIC;

/// Minimum password length for new and changed passwords.
pub const MIN_PASSWORD_LENGTH: usize = 6;

// ---------------------------------------------------------------------------
// AccessLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    Admin,
    Supervisor,
    Planner,
    Storekeeper,
    Mechanic,
}

impl AccessLevel {
    pub const ALL: [AccessLevel; 5] = [
        Self::Admin,
        Self::Supervisor,
        Self::Planner,
        Self::Storekeeper,
        Self::Mechanic,
    ];

    /// Return the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => LEVEL_ADMIN,
            Self::Supervisor => LEVEL_SUPERVISOR,
            Self::Planner => LEVEL_PLANNER,
            Self::Storekeeper => LEVEL_STOREKEEPER,
            Self::Mechanic => LEVEL_MECHANIC,
        }
    }

    /// Parse from a string, returning an error for unknown levels.
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            LEVEL_ADMIN => Ok(Self::Admin),
            LEVEL_SUPERVISOR => Ok(Self::Supervisor),
            LEVEL_PLANNER => Ok(Self::Planner),
            LEVEL_STOREKEEPER => Ok(Self::Storekeeper),
            LEVEL_MECHANIC => Ok(Self::Mechanic),
            other => Err(CoreError::Validation(format!(
                "Invalid access level: '{other}'. Valid levels: {}",
                VALID_LEVELS.join(", ")
            ))),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Supervisor => "Supervisor",
            Self::Planner => "Maintenance Planner",
            Self::Storekeeper => "Storekeeper",
            Self::Mechanic => "Mechanic",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Admin => "Full access to every module, including user management",
            Self::Supervisor => "Manages equipment, mechanics, tires, plans and approvals",
            Self::Planner => "Plans and opens work orders, oil analyses and preventive runs",
            Self::Storekeeper => "Manages parts, stock movements, counts and imports",
            Self::Mechanic => "Views work and executes assigned work orders",
        }
    }

    // -- Guards ------------------------------------------------------------

    pub fn allows_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    pub fn allows_supervisor(&self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor)
    }

    pub fn allows_planner(&self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor | Self::Planner)
    }

    pub fn allows_storekeeper(&self) -> bool {
        matches!(self, Self::Admin | Self::Supervisor | Self::Storekeeper)
    }

    /// Work-order execution: everyone except storekeepers.
    pub fn allows_mechanic(&self) -> bool {
        matches!(
            self,
            Self::Admin | Self::Supervisor | Self::Planner | Self::Mechanic
        )
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// Client-facing permission flags derived from an access level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permissions {
    pub access_level: &'static str,
    pub can_edit_equipment: bool,
    pub can_manage_stock: bool,
    pub can_create_work_orders: bool,
    pub can_execute_work_orders: bool,
    pub can_manage_users: bool,
    pub can_manage_mechanics: bool,
    pub can_manage_tires: bool,
}

impl Permissions {
    pub fn for_level(level: AccessLevel) -> Self {
        use AccessLevel::*;
        Self {
            access_level: level.as_str(),
            can_edit_equipment: level.allows_supervisor(),
            can_manage_stock: level.allows_storekeeper(),
            can_create_work_orders: level.allows_planner(),
            can_execute_work_orders: matches!(level, Admin | Supervisor | Mechanic),
            can_manage_users: level.allows_admin(),
            can_manage_mechanics: level.allows_supervisor(),
            can_manage_tires: level.allows_supervisor(),
        }
    }
}

/// Entry returned by the access-level listing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct AccessLevelInfo {
    pub value: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// All levels with display metadata, most privileged first.
pub fn access_level_catalog() -> Vec<AccessLevelInfo> {
    AccessLevel::ALL
        .iter()
        .map(|level| AccessLevelInfo {
            value: level.as_str(),
            name: level.display_name(),
            description: level.description(),
        })
        .collect()
}

/// Validate a new password against the minimum length.
pub fn validate_new_password(password: &str) -> Result<(), CoreError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        )));
    }
    Ok(())
}
