// Scheduler module: fires the reminder scan once per day

pub mod engine;

pub use engine::{DailyScheduler, ReminderJob, Scheduler};
