//! Daily payment-reminder scheduler.

pub mod config;
pub mod schedule;
pub mod scheduler;

pub use config::WorkerConfig;
pub use schedule::DailySchedule;
pub use scheduler::ReminderScheduler;
