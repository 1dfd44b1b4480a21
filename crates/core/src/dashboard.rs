//! Dashboard time windows.

use chrono::Duration;
use serde::Serialize;

use crate::types::Timestamp;

/// Number of windows in the work-order trend chart.
pub const TREND_WINDOWS: i64 = 6;
/// Length of each trend window and of the monthly cost period.
pub const WINDOW_DAYS: i64 = 30;

/// A half-open `[start, end)` window with its chart label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendWindow {
    pub label: String,
    #[serde(skip)]
    pub start: Timestamp,
    #[serde(skip)]
    pub end: Timestamp,
}

/// Consecutive trend windows ending at `now`, oldest first.
pub fn trend_windows(now: Timestamp) -> Vec<TrendWindow> {
    (0..TREND_WINDOWS)
        .rev()
        .map(|i| {
            let end = now - Duration::days(WINDOW_DAYS * i);
            let start = end - Duration::days(WINDOW_DAYS);
            TrendWindow {
                label: start.format("%m/%Y").to_string(),
                start,
                end,
            }
        })
        .collect()
}

/// Start of the monthly cost period.
pub fn monthly_cost_since(now: Timestamp) -> Timestamp {
    now - Duration::days(WINDOW_DAYS)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn windows_are_contiguous_and_oldest_first() {
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();
        let windows = trend_windows(now);
        assert_eq!(windows.len(), 6);
        assert_eq!(windows.last().unwrap().end, now);
        for pair in windows.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
        assert_eq!(windows[5].label, "06/2024");
        assert_eq!(windows[0].start, now - Duration::days(180));
    }
}
