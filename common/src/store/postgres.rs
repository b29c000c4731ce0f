// PostgreSQL-backed store

use crate::db::repositories::{BirthdayRepository, SettingsRepository};
use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Birthday, DayMonth, ReminderSetting};
use crate::store::BirthdayStore;
use async_trait::async_trait;

/// Store backed by the `birthdays` and `group_settings` tables
#[derive(Debug, Clone)]
pub struct PgStore {
    birthdays: BirthdayRepository,
    settings: SettingsRepository,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self {
            birthdays: BirthdayRepository::new(pool.clone()),
            settings: SettingsRepository::new(pool),
        }
    }

    pub fn settings(&self) -> &SettingsRepository {
        &self.settings
    }
}

#[async_trait]
impl BirthdayStore for PgStore {
    async fn find_by_group(&self, group_id: i64) -> Result<Vec<Birthday>, DatabaseError> {
        self.birthdays.find_by_group(group_id).await
    }

    async fn upsert_birthday(
        &self,
        group_id: i64,
        name: &str,
        date: DayMonth,
    ) -> Result<(), DatabaseError> {
        self.birthdays.upsert(group_id, name, date).await
    }

    async fn delete_birthday(&self, group_id: i64, name: &str) -> Result<u64, DatabaseError> {
        self.birthdays.delete(group_id, name).await
    }

    async fn get_setting(&self, group_id: i64) -> Result<ReminderSetting, DatabaseError> {
        self.settings.reminder_setting(group_id).await
    }

    async fn set_enabled(&self, group_id: i64, enabled: bool) -> Result<(), DatabaseError> {
        self.settings.set_enabled(group_id, enabled).await
    }

    async fn find_due_birthdays(&self, date: DayMonth) -> Result<Vec<Birthday>, DatabaseError> {
        self.birthdays.find_due(date).await
    }
}
