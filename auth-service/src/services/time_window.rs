//! Fixed-offset time windows for access policy checks.
//!
//! Windows are half-open minute ranges over a day, evaluated against "now"
//! shifted into a fixed-offset timezone (no daylight-saving adjustment).

use chrono::{DateTime, Duration, Timelike, Utc};

/// India Standard Time, UTC+05:30.
pub const IST_OFFSET_MINUTES: i32 = 330;

/// Mobile devices may log in 10:00-13:00 IST.
pub const MOBILE_LOGIN_WINDOW: TimeWindow = TimeWindow {
    start_minute: 10 * 60,
    end_minute: 13 * 60,
};

/// Audio uploads are allowed 14:00-19:00 IST.
pub const AUDIO_UPLOAD_WINDOW: TimeWindow = TimeWindow {
    start_minute: 14 * 60,
    end_minute: 19 * 60,
};

/// A `[start, end)` range of minutes since local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start_minute: u32,
    pub end_minute: u32,
}

impl TimeWindow {
    /// True when `now_utc`, shifted by `offset_minutes`, falls inside the
    /// window. The end minute itself is outside (half-open range).
    pub fn contains(&self, now_utc: DateTime<Utc>, offset_minutes: i32) -> bool {
        let shifted = now_utc + Duration::minutes(i64::from(offset_minutes));
        let minute_of_day = shifted.hour() * 60 + shifted.minute();
        self.start_minute <= minute_of_day && minute_of_day < self.end_minute
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, h, m, 0).unwrap()
    }

    #[test]
    fn test_inside_mobile_window() {
        // 11:00 IST == 05:30 UTC
        assert!(MOBILE_LOGIN_WINDOW.contains(utc(5, 30), IST_OFFSET_MINUTES));
    }

    #[test]
    fn test_outside_mobile_window() {
        // 15:00 IST == 09:30 UTC
        assert!(!MOBILE_LOGIN_WINDOW.contains(utc(9, 30), IST_OFFSET_MINUTES));
    }

    #[test]
    fn test_start_minute_is_inclusive() {
        // 10:00 IST == 04:30 UTC
        assert!(MOBILE_LOGIN_WINDOW.contains(utc(4, 30), IST_OFFSET_MINUTES));
    }

    #[test]
    fn test_end_minute_is_exclusive() {
        // Exactly 13:00 IST == 07:30 UTC must be rejected.
        assert!(!MOBILE_LOGIN_WINDOW.contains(utc(7, 30), IST_OFFSET_MINUTES));
        // One minute earlier is still inside.
        assert!(MOBILE_LOGIN_WINDOW.contains(utc(7, 29), IST_OFFSET_MINUTES));
    }

    #[test]
    fn test_offset_shift_across_midnight() {
        // 22:00 UTC + 5:30 == 03:30 local the next day.
        let window = TimeWindow {
            start_minute: 3 * 60,
            end_minute: 4 * 60,
        };
        assert!(window.contains(utc(22, 0), IST_OFFSET_MINUTES));
    }

    #[test]
    fn test_audio_window_bounds() {
        // 14:00 IST == 08:30 UTC, 19:00 IST == 13:30 UTC
        assert!(AUDIO_UPLOAD_WINDOW.contains(utc(8, 30), IST_OFFSET_MINUTES));
        assert!(!AUDIO_UPLOAD_WINDOW.contains(utc(13, 30), IST_OFFSET_MINUTES));
    }
}
