// In-memory store with the same semantics as the Postgres store

use crate::errors::DatabaseError;
use crate::models::{Birthday, DayMonth, ReminderSetting};
use crate::store::BirthdayStore;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    next_id: i64,
    birthdays: Vec<Birthday>,
    settings: HashMap<i64, bool>,
}

impl Tables {
    fn push(&mut self, group_id: i64, name: &str, day: i32, month: i32) {
        self.next_id += 1;
        self.birthdays.push(Birthday {
            id: self.next_id,
            group_id,
            name: name.to_string(),
            day,
            month,
        });
    }
}

/// Store kept entirely in process memory
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a row without the (group, name) uniqueness check,
    /// as a store lacking that constraint would
    pub async fn insert_unchecked(&self, group_id: i64, name: &str, date: DayMonth) {
        let mut tables = self.tables.write().await;
        tables.push(group_id, name, date.day() as i32, date.month() as i32);
    }

    /// Number of stored birthday rows across all groups
    pub async fn birthday_count(&self) -> usize {
        self.tables.read().await.birthdays.len()
    }
}

#[async_trait]
impl BirthdayStore for InMemoryStore {
    async fn find_by_group(&self, group_id: i64) -> Result<Vec<Birthday>, DatabaseError> {
        let tables = self.tables.read().await;
        let mut birthdays: Vec<Birthday> = tables
            .birthdays
            .iter()
            .filter(|b| b.group_id == group_id)
            .cloned()
            .collect();
        birthdays.sort_by(|a, b| {
            (a.month, a.day, &a.name).cmp(&(b.month, b.day, &b.name))
        });
        Ok(birthdays)
    }

    async fn upsert_birthday(
        &self,
        group_id: i64,
        name: &str,
        date: DayMonth,
    ) -> Result<(), DatabaseError> {
        let mut tables = self.tables.write().await;
        let day = date.day() as i32;
        let month = date.month() as i32;

        if let Some(existing) = tables
            .birthdays
            .iter_mut()
            .find(|b| b.group_id == group_id && b.name == name)
        {
            existing.day = day;
            existing.month = month;
            return Ok(());
        }

        tables.push(group_id, name, day, month);
        Ok(())
    }

    async fn delete_birthday(&self, group_id: i64, name: &str) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.write().await;
        let before = tables.birthdays.len();
        tables
            .birthdays
            .retain(|b| !(b.group_id == group_id && b.name == name));
        Ok((before - tables.birthdays.len()) as u64)
    }

    async fn get_setting(&self, group_id: i64) -> Result<ReminderSetting, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(ReminderSetting::from(tables.settings.get(&group_id).copied()))
    }

    async fn set_enabled(&self, group_id: i64, enabled: bool) -> Result<(), DatabaseError> {
        self.tables.write().await.settings.insert(group_id, enabled);
        Ok(())
    }

    async fn find_due_birthdays(&self, date: DayMonth) -> Result<Vec<Birthday>, DatabaseError> {
        let tables = self.tables.read().await;
        let day = date.day() as i32;
        let month = date.month() as i32;

        let mut due: Vec<Birthday> = tables
            .birthdays
            .iter()
            .filter(|b| b.day == day && b.month == month)
            .filter(|b| tables.settings.get(&b.group_id) != Some(&false))
            .cloned()
            .collect();
        due.sort_by_key(|b| (b.group_id, b.id));
        Ok(due)
    }
}
