// Reminder dispatch: finds due birthdays and sends one message per group

pub mod engine;
pub mod grouping;

pub use engine::{ReminderEngine, ScanReport};
pub use grouping::{format_reminder, group_due_birthdays, GroupReminder};
