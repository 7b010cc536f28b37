use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A Google Calendar event resource, passed through untouched.
pub type EventItem = Value;

/// Half-open query window `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl EventWindow {
    pub fn next_hour(now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            end: now + Duration::hours(1),
        }
    }

    pub fn time_min(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn time_max(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsResponse {
    pub events: Vec<EventItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn next_hour_window_is_one_hour_wide() {
        let now = Utc.with_ymd_and_hms(2024, 8, 22, 9, 15, 0).unwrap();
        let window = EventWindow::next_hour(now);
        assert_eq!(window.end - window.start, Duration::hours(1));
        assert_eq!(window.time_min(), "2024-08-22T09:15:00.000000Z");
        assert_eq!(window.time_max(), "2024-08-22T10:15:00.000000Z");
    }
}
