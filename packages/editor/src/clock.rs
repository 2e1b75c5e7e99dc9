//! Time source for annotation timestamps.

use chrono::{Local, NaiveDateTime};
use std::fmt;

/// `D MMM YYYY h:mm:ss AM/PM`, e.g. `5 Mar 2024 2:07:09 PM`
///
/// Shared with the export layer, so it must not depend on locale.
pub const TIMESTAMP_FORMAT: &str = "%-d %b %Y %-I:%M:%S %p";

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock in the local time zone
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Clock frozen at a single instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(NaiveDateTime);

impl FixedClock {
    pub fn new(at: NaiveDateTime) -> Self {
        Self(at)
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn format_timestamp(at: &NaiveDateTime) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_afternoon_format() {
        assert_eq!(
            format_timestamp(&at(2024, 3, 5, 14, 7, 9)),
            "5 Mar 2024 2:07:09 PM"
        );
    }

    #[test]
    fn test_midnight_and_noon_use_twelve() {
        assert_eq!(
            format_timestamp(&at(2023, 12, 31, 0, 0, 0)),
            "31 Dec 2023 12:00:00 AM"
        );
        assert_eq!(
            format_timestamp(&at(2023, 1, 1, 12, 30, 5)),
            "1 Jan 2023 12:30:05 PM"
        );
    }

    #[test]
    fn test_fixed_clock() {
        let clock = FixedClock::new(at(2025, 7, 4, 9, 5, 0));
        assert_eq!(format_timestamp(&clock.now()), "4 Jul 2025 9:05:00 AM");
    }
}
