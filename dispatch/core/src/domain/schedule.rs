// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Weekly business-hours schedule.
//!
//! When `AssignmentPolicy::business_hours_only` is set, a cycle runs only
//! if the current time falls inside the open window for the current
//! weekday. Windows are expressed in UTC; a day without a window is
//! closed.

use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Open window for a single weekday, inclusive of `open`, exclusive of
/// `close`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenWindow {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl OpenWindow {
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.open && time < self.close
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklySchedule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuesday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wednesday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thursday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saturday: Option<OpenWindow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sunday: Option<OpenWindow>,
}

impl WeeklySchedule {
    /// Monday–Friday 09:00–17:00 UTC.
    pub fn weekdays_nine_to_five() -> Self {
        let window = OpenWindow {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            close: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        Self {
            monday: Some(window),
            tuesday: Some(window),
            wednesday: Some(window),
            thursday: Some(window),
            friday: Some(window),
            saturday: None,
            sunday: None,
        }
    }

    pub fn window_for(&self, weekday: Weekday) -> Option<OpenWindow> {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        match self.window_for(now.weekday()) {
            Some(window) => window.contains(now.time()),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn open_inside_weekday_window() {
        let schedule = WeeklySchedule::weekdays_nine_to_five();
        // A Wednesday.
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 10, 30, 0).unwrap();
        assert!(schedule.is_open_at(now));
    }

    #[test]
    fn closed_before_open_and_at_close() {
        let schedule = WeeklySchedule::weekdays_nine_to_five();
        let early = Utc.with_ymd_and_hms(2026, 3, 4, 8, 59, 59).unwrap();
        let at_close = Utc.with_ymd_and_hms(2026, 3, 4, 17, 0, 0).unwrap();
        assert!(!schedule.is_open_at(early));
        assert!(!schedule.is_open_at(at_close));
    }

    #[test]
    fn closed_on_day_without_window() {
        let schedule = WeeklySchedule::weekdays_nine_to_five();
        // A Saturday.
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 12, 0, 0).unwrap();
        assert!(!schedule.is_open_at(now));
    }
}
