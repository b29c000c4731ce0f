// Store adapter boundary shared by the command handlers and the reminder engine

pub mod memory;
pub mod postgres;

use crate::errors::DatabaseError;
use crate::models::{Birthday, DayMonth, ReminderSetting};
use async_trait::async_trait;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// Record store for birthdays and per-group settings
///
/// Implementations hold no authoritative state of their own beyond the
/// backing store; callers must not cache results across scans.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BirthdayStore: Send + Sync {
    /// Birthdays of one group in calendar order (month, day, name)
    async fn find_by_group(&self, group_id: i64) -> Result<Vec<Birthday>, DatabaseError>;

    /// Insert or overwrite the date stored for (group, name)
    async fn upsert_birthday(
        &self,
        group_id: i64,
        name: &str,
        date: DayMonth,
    ) -> Result<(), DatabaseError>;

    /// Delete (group, name), returning the number of rows removed
    async fn delete_birthday(&self, group_id: i64, name: &str) -> Result<u64, DatabaseError>;

    /// Reminder flag for a group
    async fn get_setting(&self, group_id: i64) -> Result<ReminderSetting, DatabaseError>;

    /// Create or update the group's reminder flag atomically
    async fn set_enabled(&self, group_id: i64, enabled: bool) -> Result<(), DatabaseError>;

    /// Birthdays on `date` in every group that has not disabled reminders,
    /// ordered by group then insertion
    async fn find_due_birthdays(&self, date: DayMonth) -> Result<Vec<Birthday>, DatabaseError>;
}
