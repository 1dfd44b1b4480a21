//! Alert severity and the alert record shared by work orders and tires.

use serde::Serialize;

/// Alert severity, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
    Critical,
}

/// A single computed alert. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub kind: &'static str,
    pub severity: Severity,
    pub message: String,
}

impl Alert {
    pub fn new(kind: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            message: message.into(),
        }
    }
}

/// Sort alerts most severe first, keeping the original order among equals.
pub fn sort_by_severity<T>(alerts: &mut [T], severity: impl Fn(&T) -> Severity) {
    alerts.sort_by(|a, b| severity(b).cmp(&severity(a)));
}
