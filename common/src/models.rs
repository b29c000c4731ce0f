use crate::errors::ValidationError;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

// Leap year used to validate day/month pairs, so 29-02 is accepted
const REFERENCE_YEAR: i32 = 2024;

lazy_static! {
    static ref DAY_MONTH_PATTERN: Regex =
        Regex::new(r"^(\d{2})-(\d{2})$").expect("day-month pattern is valid");
}

// ============================================================================
// Birthday Models
// ============================================================================

/// A saved birthday, scoped to one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Birthday {
    pub id: i64,
    pub group_id: i64,
    pub name: String,
    pub day: i32,
    pub month: i32,
}

impl Birthday {
    pub fn day_month(&self) -> String {
        format!("{:02}-{:02}", self.day, self.month)
    }
}

/// Calendar day without a year
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayMonth {
    day: u32,
    month: u32,
}

impl DayMonth {
    pub fn new(day: u32, month: u32) -> Result<Self, ValidationError> {
        NaiveDate::from_ymd_opt(REFERENCE_YEAR, month, day)
            .map(|_| Self { day, month })
            .ok_or_else(|| ValidationError::InvalidDate(format!("{:02}-{:02}", day, month)))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            day: date.day(),
            month: date.month(),
        }
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn month(&self) -> u32 {
        self.month
    }
}

impl FromStr for DayMonth {
    type Err = ValidationError;

    /// Parse `DD-MM`, two digits each
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = DAY_MONTH_PATTERN
            .captures(s.trim())
            .ok_or_else(|| ValidationError::InvalidDate(s.to_string()))?;

        let day: u32 = captures[1]
            .parse()
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))?;
        let month: u32 = captures[2]
            .parse()
            .map_err(|_| ValidationError::InvalidDate(s.to_string()))?;

        Self::new(day, month)
    }
}

impl fmt::Display for DayMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.day, self.month)
    }
}

// ============================================================================
// Group Settings Models
// ============================================================================

/// Stored per-group reminder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GroupSettings {
    pub group_id: i64,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of looking up a group's reminder flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderSetting {
    Enabled,
    Disabled,
    NotConfigured,
}

impl ReminderSetting {
    /// Groups without a settings row are treated as enabled
    pub fn is_enabled(self) -> bool {
        !matches!(self, ReminderSetting::Disabled)
    }
}

impl From<Option<bool>> for ReminderSetting {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => ReminderSetting::Enabled,
            Some(false) => ReminderSetting::Disabled,
            None => ReminderSetting::NotConfigured,
        }
    }
}

// ============================================================================
// Chat Models
// ============================================================================

/// Kind of chat a command arrived from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one conversation with the bot
    Private,
    /// Group, supergroup or channel
    Group,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_day_month() {
        let dm: DayMonth = "05-06".parse().unwrap();
        assert_eq!(dm.day(), 5);
        assert_eq!(dm.month(), 6);
        assert_eq!(dm.to_string(), "05-06");
    }

    #[test]
    fn test_leap_day_is_accepted() {
        assert!("29-02".parse::<DayMonth>().is_ok());
    }

    #[test]
    fn test_invalid_day_month_rejected() {
        for input in ["31-02", "00-01", "32-01", "15-13", "15-00", "5-06", "05/06", "", "ab-cd"] {
            assert!(
                input.parse::<DayMonth>().is_err(),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_reminder_setting_default_on() {
        assert!(ReminderSetting::Enabled.is_enabled());
        assert!(ReminderSetting::NotConfigured.is_enabled());
        assert!(!ReminderSetting::Disabled.is_enabled());
        assert_eq!(ReminderSetting::from(None), ReminderSetting::NotConfigured);
        assert_eq!(ReminderSetting::from(Some(false)), ReminderSetting::Disabled);
    }

    #[test]
    fn test_birthday_day_month_format() {
        let birthday = Birthday {
            id: 1,
            group_id: -42,
            name: "Alice".to_string(),
            day: 5,
            month: 6,
        };
        assert_eq!(birthday.day_month(), "05-06");
    }
}
