//! Wall-clock arithmetic for a once-a-day job at a fixed local hour.

use chrono::{Duration, NaiveTime, TimeZone, Utc};
use classpulse_core::error::CoreError;
use classpulse_core::types::Timestamp;

/// Largest UTC offset in use anywhere, in minutes.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

/// A daily run at `hour:00` in a fixed UTC offset (no DST).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
    offset: Duration,
}

impl DailySchedule {
    pub fn new(hour: u32, utc_offset_minutes: i32) -> Result<Self, CoreError> {
        let at = NaiveTime::from_hms_opt(hour, 0, 0)
            .ok_or_else(|| CoreError::Validation(format!("Invalid reminder hour {hour}")))?;
        if utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(CoreError::Validation(format!(
                "Invalid UTC offset {utc_offset_minutes} minutes"
            )));
        }
        Ok(Self {
            at,
            offset: Duration::minutes(utc_offset_minutes.into()),
        })
    }

    /// The first scheduled instant strictly after `now`.
    pub fn next_run_after(&self, now: Timestamp) -> Timestamp {
        let local_date = (now + self.offset).date_naive();
        let today = Utc.from_utc_datetime(&(local_date.and_time(self.at) - self.offset));
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}
