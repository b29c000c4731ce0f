// Birthday repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{Birthday, DayMonth};
use tracing::instrument;

/// Repository for birthday-related database operations
#[derive(Debug, Clone)]
pub struct BirthdayRepository {
    pool: DbPool,
}

impl BirthdayRepository {
    /// Create a new BirthdayRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// All birthdays of a group in calendar order
    #[instrument(skip(self))]
    pub async fn find_by_group(&self, group_id: i64) -> Result<Vec<Birthday>, DatabaseError> {
        let birthdays = sqlx::query_as::<_, Birthday>(
            r#"
            SELECT id, group_id, name, day, month
            FROM birthdays
            WHERE group_id = $1
            ORDER BY month ASC, day ASC, name ASC
            "#,
        )
        .bind(group_id)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(group_id, count = birthdays.len(), "Found group birthdays");
        Ok(birthdays)
    }

    /// Insert a birthday, or move an existing (group, name) entry to the new date
    #[instrument(skip(self))]
    pub async fn upsert(
        &self,
        group_id: i64,
        name: &str,
        date: DayMonth,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO birthdays (group_id, name, day, month)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (group_id, name) DO UPDATE SET
                day = EXCLUDED.day,
                month = EXCLUDED.month
            "#,
        )
        .bind(group_id)
        .bind(name)
        .bind(date.day() as i32)
        .bind(date.month() as i32)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(group_id, name, date = %date, "Birthday saved");
        Ok(())
    }

    /// Delete a birthday by name, returning the number of rows removed
    #[instrument(skip(self))]
    pub async fn delete(&self, group_id: i64, name: &str) -> Result<u64, DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM birthdays
            WHERE group_id = $1 AND name = $2
            "#,
        )
        .bind(group_id)
        .bind(name)
        .execute(self.pool.pool())
        .await?;

        let rows = result.rows_affected();
        tracing::info!(group_id, name, rows, "Birthday delete executed");
        Ok(rows)
    }

    /// Birthdays falling on `date` in groups that have not disabled reminders
    ///
    /// Groups with no settings row are included.
    #[instrument(skip(self))]
    pub async fn find_due(&self, date: DayMonth) -> Result<Vec<Birthday>, DatabaseError> {
        let birthdays = sqlx::query_as::<_, Birthday>(
            r#"
            SELECT id, group_id, name, day, month
            FROM birthdays
            WHERE day = $1 AND month = $2
              AND group_id NOT IN (
                  SELECT group_id FROM group_settings WHERE enabled = FALSE
              )
            ORDER BY group_id ASC, id ASC
            "#,
        )
        .bind(date.day() as i32)
        .bind(date.month() as i32)
        .fetch_all(self.pool.pool())
        .await?;

        tracing::debug!(date = %date, count = birthdays.len(), "Found due birthdays");
        Ok(birthdays)
    }
}
