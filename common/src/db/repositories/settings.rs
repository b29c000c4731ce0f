// Group settings repository implementation

use crate::db::DbPool;
use crate::errors::DatabaseError;
use crate::models::{GroupSettings, ReminderSetting};
use tracing::instrument;

/// Repository for per-group reminder settings
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: DbPool,
}

impl SettingsRepository {
    /// Create a new SettingsRepository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Full settings row for a group, if one was ever written
    #[instrument(skip(self))]
    pub async fn find(&self, group_id: i64) -> Result<Option<GroupSettings>, DatabaseError> {
        let settings = sqlx::query_as::<_, GroupSettings>(
            r#"
            SELECT group_id, enabled, created_at
            FROM group_settings
            WHERE group_id = $1
            "#,
        )
        .bind(group_id)
        .fetch_optional(self.pool.pool())
        .await?;

        Ok(settings)
    }

    /// Reminder flag for a group; `NotConfigured` when no row exists
    #[instrument(skip(self))]
    pub async fn reminder_setting(&self, group_id: i64) -> Result<ReminderSetting, DatabaseError> {
        let enabled: Option<bool> =
            sqlx::query_scalar("SELECT enabled FROM group_settings WHERE group_id = $1")
                .bind(group_id)
                .fetch_optional(self.pool.pool())
                .await?;

        Ok(ReminderSetting::from(enabled))
    }

    /// Create or update the group's row in one statement
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, group_id: i64, enabled: bool) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO group_settings (group_id, enabled)
            VALUES ($1, $2)
            ON CONFLICT (group_id) DO UPDATE SET enabled = EXCLUDED.enabled
            "#,
        )
        .bind(group_id)
        .bind(enabled)
        .execute(self.pool.pool())
        .await?;

        tracing::info!(group_id, enabled, "Group reminder setting updated");
        Ok(())
    }
}
