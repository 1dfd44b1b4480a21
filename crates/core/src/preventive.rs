//! Preventive-maintenance scheduling.
//!
//! A plan repeats every `interval_days`, `interval_hours` (equipment hour
//! meter) and/or `interval_km`. After each execution the next due point is
//! projected from the last one; a plan is due when the calendar date falls
//! inside its lead window or the equipment hour meter has reached the
//! projected reading.

use chrono::Duration;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Default number of days before the due date at which a plan becomes due.
pub const DEFAULT_LEAD_DAYS: i32 = 7;

/// Upper bound for `interval_days` and `lead_days` (one hundred years).
pub const MAX_SCHEDULE_DAYS: i32 = 36_500;

/// Reason placed on work orders generated from a plan.
pub fn work_order_description(plan_name: &str) -> String {
    format!("Scheduled preventive maintenance: {plan_name}")
}

/// Scheduling fields of a plan.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub is_active: bool,
    pub interval_hours: Option<i32>,
    pub interval_days: Option<i32>,
    pub interval_km: Option<f64>,
    pub lead_days: i32,
    pub last_executed_at: Option<Timestamp>,
    pub last_hour_meter: Option<f64>,
    pub last_km: Option<f64>,
    pub next_due_at: Option<Timestamp>,
    pub next_hour_meter: Option<f64>,
    pub next_km: Option<f64>,
}

/// At least one interval must be set and none may be non-positive.
pub fn validate_intervals(
    interval_hours: Option<i32>,
    interval_days: Option<i32>,
    interval_km: Option<f64>,
) -> Result<(), CoreError> {
    if interval_hours.is_none() && interval_days.is_none() && interval_km.is_none() {
        return Err(CoreError::Validation(
            "At least one interval (hours, days or km) is required".to_string(),
        ));
    }
    if interval_hours.is_some_and(|h| h <= 0)
        || interval_days.is_some_and(|d| d <= 0)
        || interval_km.is_some_and(|k| k <= 0.0)
    {
        return Err(CoreError::Validation(
            "Intervals must be greater than zero".to_string(),
        ));
    }
    if interval_days.is_some_and(|d| d > MAX_SCHEDULE_DAYS) {
        return Err(CoreError::Validation(format!(
            "interval_days must not exceed {MAX_SCHEDULE_DAYS}"
        )));
    }
    Ok(())
}

/// Lead window in days: `0..=MAX_SCHEDULE_DAYS`.
pub fn validate_lead_days(lead_days: i32) -> Result<(), CoreError> {
    if !(0..=MAX_SCHEDULE_DAYS).contains(&lead_days) {
        return Err(CoreError::Validation(format!(
            "lead_days must be between 0 and {MAX_SCHEDULE_DAYS}"
        )));
    }
    Ok(())
}

fn add_days(base: Timestamp, days: i32) -> Option<Timestamp> {
    base.checked_add_signed(Duration::days(i64::from(days)))
}

impl Schedule {
    /// Project the next due point from the last execution.
    ///
    /// Inactive plans are left untouched. `equipment_hour_meter` is used as the
    /// base when the plan has never recorded a reading. Fails when the
    /// projected date falls outside the representable range.
    pub fn compute_next_due(
        &mut self,
        now: Timestamp,
        equipment_hour_meter: Option<f64>,
    ) -> Result<(), CoreError> {
        if !self.is_active {
            return Ok(());
        }

        if let Some(days) = self.interval_days {
            let base = self.last_executed_at.unwrap_or(now);
            let next = add_days(base, days).ok_or_else(|| {
                CoreError::Validation(format!("interval_days {days} is out of range"))
            })?;
            self.next_due_at = Some(next);
        }

        if let Some(hours) = self.interval_hours {
            let base = self
                .last_hour_meter
                .unwrap_or_else(|| equipment_hour_meter.unwrap_or(0.0));
            self.next_hour_meter = Some(base + f64::from(hours));
        }

        if let (Some(km), Some(last)) = (self.interval_km, self.last_km) {
            self.next_km = Some(last + km);
        }
        Ok(())
    }

    /// Whether a work order should be generated now.
    pub fn is_due(&self, now: Timestamp, equipment_hour_meter: Option<f64>) -> bool {
        if !self.is_active {
            return false;
        }

        if let Some(due) = self.next_due_at {
            // A window past the representable range covers every due date.
            let due_in_window = add_days(now, self.lead_days).map_or(true, |limit| due <= limit);
            if due_in_window {
                return true;
            }
        }

        // A zero target means the plan is not scheduled by hour meter.
        if let (Some(next), Some(current)) = (self.next_hour_meter, equipment_hour_meter) {
            if next > 0.0 && current > 0.0 && current >= next {
                return true;
            }
        }

        // Equipment carries no odometer, so the km projection never triggers.
        false
    }

    /// Record an execution at `now` and re-project.
    pub fn record_execution(
        &mut self,
        now: Timestamp,
        equipment_hour_meter: Option<f64>,
        km_current: Option<f64>,
    ) -> Result<(), CoreError> {
        self.last_executed_at = Some(now);
        if let Some(hm) = equipment_hour_meter.filter(|hm| *hm > 0.0) {
            self.last_hour_meter = Some(hm);
        }
        if km_current.is_some() {
            self.last_km = km_current;
        }
        self.compute_next_due(now, equipment_hour_meter)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
    }

    fn active() -> Schedule {
        Schedule {
            is_active: true,
            lead_days: DEFAULT_LEAD_DAYS,
            ..Default::default()
        }
    }

    #[test]
    fn intervals_are_required() {
        assert!(validate_intervals(None, None, None).is_err());
        assert!(validate_intervals(Some(250), None, None).is_ok());
        assert!(validate_intervals(None, Some(0), None).is_err());
    }

    #[test]
    fn projection_without_history_uses_now_and_equipment() {
        let mut s = Schedule {
            interval_days: Some(30),
            interval_hours: Some(250),
            interval_km: Some(10_000.0),
            ..active()
        };
        s.compute_next_due(now(), Some(1_200.0)).unwrap();
        assert_eq!(s.next_due_at, Some(now() + Duration::days(30)));
        assert_eq!(s.next_hour_meter, Some(1_450.0));
        assert_eq!(s.next_km, None);
    }

    #[test]
    fn projection_from_last_execution() {
        let last = now() - Duration::days(10);
        let mut s = Schedule {
            interval_days: Some(15),
            interval_hours: Some(100),
            interval_km: Some(5_000.0),
            last_executed_at: Some(last),
            last_hour_meter: Some(900.0),
            last_km: Some(20_000.0),
            ..active()
        };
        s.compute_next_due(now(), Some(2_000.0)).unwrap();
        assert_eq!(s.next_due_at, Some(last + Duration::days(15)));
        assert_eq!(s.next_hour_meter, Some(1_000.0));
        assert_eq!(s.next_km, Some(25_000.0));
    }

    #[test]
    fn inactive_plans_are_not_projected_or_due() {
        let mut s = Schedule {
            interval_days: Some(1),
            ..Default::default()
        };
        s.compute_next_due(now(), None).unwrap();
        assert_eq!(s.next_due_at, None);
        s.next_due_at = Some(now() - Duration::days(100));
        assert!(!s.is_due(now(), None));
    }

    #[test]
    fn due_within_lead_window() {
        let mut s = active();
        s.next_due_at = Some(now() + Duration::days(7));
        assert!(s.is_due(now(), None));
        s.next_due_at = Some(now() + Duration::days(8));
        assert!(!s.is_due(now(), None));
    }

    #[test]
    fn due_by_hour_meter() {
        let mut s = active();
        s.next_hour_meter = Some(500.0);
        assert!(!s.is_due(now(), Some(499.0)));
        assert!(s.is_due(now(), Some(500.0)));
        s.next_hour_meter = Some(0.0);
        assert!(!s.is_due(now(), Some(0.0)));
        assert!(!s.is_due(now(), Some(1_500.0)));
    }

    #[test]
    fn interval_days_are_bounded() {
        assert!(validate_intervals(None, Some(MAX_SCHEDULE_DAYS), None).is_ok());
        assert_matches!(
            validate_intervals(None, Some(MAX_SCHEDULE_DAYS + 1), None),
            Err(CoreError::Validation(_))
        );
        assert!(validate_intervals(None, Some(i32::MAX), None).is_err());
    }

    #[test]
    fn lead_days_are_bounded() {
        assert!(validate_lead_days(0).is_ok());
        assert!(validate_lead_days(MAX_SCHEDULE_DAYS).is_ok());
        assert!(validate_lead_days(-1).is_err());
        assert!(validate_lead_days(MAX_SCHEDULE_DAYS + 1).is_err());
        assert!(validate_lead_days(i32::MAX).is_err());
    }

    #[test]
    fn huge_lead_window_is_due_without_overflow() {
        let mut s = active();
        s.lead_days = i32::MAX;
        s.next_due_at = Some(now());
        assert!(s.is_due(now(), None));
    }

    #[test]
    fn out_of_range_projection_is_an_error() {
        let mut s = Schedule {
            interval_days: Some(i32::MAX),
            ..active()
        };
        let far = Utc.with_ymd_and_hms(200_000, 1, 1, 0, 0, 0).unwrap();
        assert_matches!(
            s.compute_next_due(far, None),
            Err(CoreError::Validation(_))
        );
        assert_eq!(s.next_due_at, None);
    }

    #[test]
    fn execution_records_readings() {
        let mut s = Schedule {
            interval_hours: Some(250),
            interval_days: Some(30),
            ..active()
        };
        s.record_execution(now(), Some(1_000.0), Some(42.0)).unwrap();
        assert_eq!(s.last_executed_at, Some(now()));
        assert_eq!(s.last_hour_meter, Some(1_000.0));
        assert_eq!(s.last_km, Some(42.0));
        assert_eq!(s.next_hour_meter, Some(1_250.0));
        assert_eq!(s.next_due_at, Some(now() + Duration::days(30)));
    }

    #[test]
    fn zero_hour_meter_is_not_recorded() {
        let mut s = Schedule {
            interval_hours: Some(100),
            ..active()
        };
        s.record_execution(now(), Some(0.0), None).unwrap();
        assert_eq!(s.last_hour_meter, None);
        assert_eq!(s.next_hour_meter, Some(100.0));
    }
}
