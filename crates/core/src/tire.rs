//! Tire lifecycle: mounting, removal, treatments (retread / discard) and the
//! wear figures derived from mileage and tread depth.

use crate::alert::{Alert, Severity};
use crate::error::CoreError;
use crate::numeric::round2;
use crate::types::Timestamp;
use crate::validation::validate_one_of;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const TYPE_NEW: &str = "new";
pub const TYPE_RETREADED: &str = "retreaded";

pub const VALID_TYPES: &[&str] = &[TYPE_NEW, TYPE_RETREADED];

pub const STATUS_STOCK: &str = "stock";
pub const STATUS_IN_USE: &str = "in_use";
pub const STATUS_DISCARDED: &str = "discarded";
pub const STATUS_RETREADING: &str = "retreading";

pub const VALID_STATUSES: &[&str] =
    &[STATUS_STOCK, STATUS_IN_USE, STATUS_DISCARDED, STATUS_RETREADING];

/// Tread depth below which a tire is flagged.
pub const LOW_TREAD_MM: f64 = 3.0;
/// Tread depth below which the flag is critical.
pub const CRITICAL_TREAD_MM: f64 = 1.5;
/// Life used at which a tire is flagged.
pub const END_OF_LIFE_PERCENT: f64 = 90.0;
/// Life used at which the flag is critical.
pub const CRITICAL_LIFE_PERCENT: f64 = 95.0;
/// Life used above which a tire is listed in the wear section of the report.
pub const HIGH_WEAR_PERCENT: f64 = 80.0;

pub fn validate_type(tire_type: &str) -> Result<(), CoreError> {
    validate_one_of("tire type", tire_type, VALID_TYPES)
}

pub fn validate_status(status: &str) -> Result<(), CoreError> {
    validate_one_of("tire status", status, VALID_STATUSES)
}

// ---------------------------------------------------------------------------
// Wear
// ---------------------------------------------------------------------------

/// Kilometres run since installation.
pub fn km_run(km_at_install: Option<f64>, km_current: Option<f64>) -> Option<f64> {
    match (km_at_install, km_current) {
        (Some(start), Some(current)) => Some(current - start),
        _ => None,
    }
}

/// Share of the estimated life already used, as a percentage.
pub fn life_used_percent(km_run: Option<f64>, estimated_life_km: Option<f64>) -> Option<f64> {
    match (km_run, estimated_life_km) {
        (Some(run), Some(life)) if life > 0.0 => Some(round2(run / life * 100.0)),
        _ => None,
    }
}

/// Wear alerts for a tire that has not been discarded.
pub fn wear_alerts(tread_depth_mm: Option<f64>, life_used_percent: Option<f64>) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if let Some(depth) = tread_depth_mm {
        if depth < LOW_TREAD_MM {
            let severity = if depth < CRITICAL_TREAD_MM {
                Severity::Critical
            } else {
                Severity::High
            };
            alerts.push(Alert::new(
                "low_tread",
                severity,
                format!("Tread depth {depth}mm is below {LOW_TREAD_MM}mm"),
            ));
        }
    }

    if let Some(used) = life_used_percent {
        if used >= END_OF_LIFE_PERCENT {
            let severity = if used >= CRITICAL_LIFE_PERCENT {
                Severity::Critical
            } else {
                Severity::High
            };
            alerts.push(Alert::new(
                "end_of_life",
                severity,
                format!("{used}% of estimated life used"),
            ));
        }
    }

    alerts
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

fn require_status(current: &str, expected: &str, action: &str) -> Result<(), CoreError> {
    if current != expected {
        return Err(CoreError::Validation(format!(
            "Tire must be in '{expected}' to {action} (current status: {current})"
        )));
    }
    Ok(())
}

pub fn check_can_install(status: &str) -> Result<(), CoreError> {
    require_status(status, STATUS_STOCK, "be installed")
}

pub fn check_can_remove(status: &str) -> Result<(), CoreError> {
    require_status(status, STATUS_IN_USE, "be removed")
}

pub fn check_can_update_mileage(status: &str) -> Result<(), CoreError> {
    require_status(status, STATUS_IN_USE, "update mileage")
}

pub fn check_can_return_from_retread(status: &str) -> Result<(), CoreError> {
    require_status(status, STATUS_RETREADING, "return from retreading")
}

pub fn check_can_delete(status: &str) -> Result<(), CoreError> {
    if status == STATUS_IN_USE {
        return Err(CoreError::Validation(
            "Tires in use cannot be deleted; remove the tire first".to_string(),
        ));
    }
    Ok(())
}

/// Status a removed tire goes to. Defaults to stock.
pub fn removal_status(reason: Option<&str>) -> Result<&'static str, CoreError> {
    match reason.unwrap_or(STATUS_STOCK) {
        STATUS_STOCK => Ok(STATUS_STOCK),
        STATUS_RETREADING => Ok(STATUS_RETREADING),
        STATUS_DISCARDED => Ok(STATUS_DISCARDED),
        other => Err(CoreError::Validation(format!(
            "Invalid removal reason: '{other}'. Valid reasons: stock, retreading, discarded"
        ))),
    }
}

/// Mileage readings never go below the installation reading.
pub fn validate_mileage(km_current: f64, km_at_install: Option<f64>) -> Result<(), CoreError> {
    if km_current < 0.0 {
        return Err(CoreError::Validation("Mileage must not be negative".to_string()));
    }
    if let Some(start) = km_at_install {
        if km_current < start {
            return Err(CoreError::Validation(format!(
                "Current mileage ({km_current}) cannot be lower than the installation mileage ({start})"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Treatments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    Retread,
    Discard,
    ReturnToStock,
}

impl Treatment {
    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            "retread" => Ok(Self::Retread),
            "discard" => Ok(Self::Discard),
            "return_to_stock" => Ok(Self::ReturnToStock),
            other => Err(CoreError::Validation(format!(
                "Invalid treatment: '{other}'. Valid treatments: retread, discard, return_to_stock"
            ))),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Retread => "RETREAD",
            Self::Discard => "DISCARD",
            Self::ReturnToStock => "RETURN TO STOCK",
        }
    }

    pub fn target_status(&self) -> &'static str {
        match self {
            Self::Retread => STATUS_RETREADING,
            Self::Discard => STATUS_DISCARDED,
            Self::ReturnToStock => STATUS_STOCK,
        }
    }

    /// Check the treatment-specific required field.
    pub fn validate(
        &self,
        retread_supplier: Option<&str>,
        discard_reason: Option<&str>,
    ) -> Result<(), CoreError> {
        let blank = |v: Option<&str>| v.map(str::trim).unwrap_or("").is_empty();
        match self {
            Self::Retread if blank(retread_supplier) => Err(CoreError::Validation(
                "Field 'retread_supplier' is required for retreading".to_string(),
            )),
            Self::Discard if blank(discard_reason) => Err(CoreError::Validation(
                "Field 'discard_reason' is required for discarding".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Notes log
// ---------------------------------------------------------------------------

/// Append a dated line to a tire's notes.
pub fn append_note(existing: Option<&str>, at: Timestamp, text: &str) -> String {
    let line = format!("{}: {text}", at.format("%d/%m/%Y"));
    match existing.map(str::trim_end) {
        Some(prev) if !prev.is_empty() => format!("{prev}\n{line}"),
        _ => line,
    }
}

/// Text logged for a treatment.
pub fn treatment_note(treatment: Treatment, notes: Option<&str>) -> String {
    match notes.map(str::trim).filter(|n| !n.is_empty()) {
        Some(n) => format!("TREATMENT {} - {n}", treatment.label()),
        None => format!("TREATMENT {}", treatment.label()),
    }
}

/// Text logged for a tread measurement.
pub fn tread_note(previous_mm: Option<f64>, new_mm: f64) -> String {
    match previous_mm {
        Some(prev) => format!("Tread measurement: {prev}mm -> {new_mm}mm"),
        None => format!("Tread measurement: {new_mm}mm"),
    }
}
