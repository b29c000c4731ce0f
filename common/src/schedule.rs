// Daily trigger calculation
//
// The reminder fires on a cron expression evaluated in one fixed time zone.
// That same zone decides which calendar date a scan belongs to, so "today"
// never disagrees with the fire time around midnight.

use crate::errors::ScheduleError;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use cron::Schedule as CronSchedule;
use std::str::FromStr;

/// Parse and validate a cron expression
pub fn parse_cron_expression(expression: &str) -> Result<CronSchedule, ScheduleError> {
    CronSchedule::from_str(expression).map_err(|e| ScheduleError::InvalidCronExpression {
        expression: expression.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an IANA time zone name
pub fn parse_timezone(name: &str) -> Result<Tz, ScheduleError> {
    Tz::from_str(name).map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))
}

/// A cron schedule bound to the zone used for all date math
#[derive(Debug, Clone)]
pub struct DailyTrigger {
    schedule: CronSchedule,
    timezone: Tz,
}

impl DailyTrigger {
    pub fn new(expression: &str, timezone: &str) -> Result<Self, ScheduleError> {
        Ok(Self {
            schedule: parse_cron_expression(expression)?,
            timezone: parse_timezone(timezone)?,
        })
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Next fire instant strictly after `reference`
    pub fn next_after(&self, reference: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let reference_in_tz = reference.with_timezone(&self.timezone);

        self.schedule
            .after(&reference_in_tz)
            .next()
            .map(|next| next.with_timezone(&Utc))
            .ok_or_else(|| ScheduleError::NoNextExecution {
                schedule_type: "cron".to_string(),
            })
    }

    /// Calendar date of `instant` in the trigger's zone
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.timezone).date_naive()
    }
}
