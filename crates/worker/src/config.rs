use std::time::Duration;

use classpulse_events::reminders::REMINDER_BUDGET;
use classpulse_events::DeliveryConfig;

use crate::schedule::DailySchedule;

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub schedule: DailySchedule,
    /// Wall-clock ceiling for one reminder run.
    pub budget: Duration,
    pub delivery: DeliveryConfig,
}

impl WorkerConfig {
    /// | Env Var                      | Default |
    /// |------------------------------|---------|
    /// | `REMINDER_HOUR`              | `9`     |
    /// | `REMINDER_UTC_OFFSET_MINUTES`| `330`   |
    /// | `REMINDER_BUDGET_SECS`       | `500`   |
    ///
    /// Provider settings come from [`DeliveryConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on unparsable numbers or an impossible hour or offset.
    pub fn from_env() -> Self {
        let hour: u32 = std::env::var("REMINDER_HOUR")
            .unwrap_or_else(|_| "9".into())
            .parse()
            .expect("REMINDER_HOUR must be a valid u32");

        let offset_minutes: i32 = std::env::var("REMINDER_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "330".into())
            .parse()
            .expect("REMINDER_UTC_OFFSET_MINUTES must be a valid i32");

        let budget = std::env::var("REMINDER_BUDGET_SECS")
            .ok()
            .map(|secs| {
                Duration::from_secs(
                    secs.parse()
                        .expect("REMINDER_BUDGET_SECS must be a valid u64"),
                )
            })
            .unwrap_or(REMINDER_BUDGET);

        let schedule = DailySchedule::new(hour, offset_minutes)
            .unwrap_or_else(|e| panic!("Invalid reminder schedule: {e}"));

        Self {
            schedule,
            budget,
            delivery: DeliveryConfig::from_env(),
        }
    }
}
