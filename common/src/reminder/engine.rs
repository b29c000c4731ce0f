// Reminder dispatch engine

use crate::delivery::DeliverySink;
use crate::errors::DatabaseError;
use crate::models::DayMonth;
use crate::reminder::grouping::group_due_birthdays;
use crate::store::BirthdayStore;
use crate::telemetry;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

/// Counts from one scan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Birthday rows returned by the due query
    pub due_entries: usize,
    /// Groups that had at least one name to celebrate
    pub groups: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Finds the day's birthdays and sends one message per enabled group
pub struct ReminderEngine {
    store: Arc<dyn BirthdayStore>,
    sink: Arc<dyn DeliverySink>,
}

impl ReminderEngine {
    pub fn new(store: Arc<dyn BirthdayStore>, sink: Arc<dyn DeliverySink>) -> Self {
        Self { store, sink }
    }

    /// Run one scan for `date`, the current date in the reminder time zone.
    ///
    /// A failed query aborts the scan. A failed send is logged and counted;
    /// the remaining groups are still served.
    #[instrument(skip(self))]
    pub async fn run_for_date(&self, date: NaiveDate) -> Result<ScanReport, DatabaseError> {
        let started = Instant::now();
        let today = DayMonth::from_date(date);

        info!(date = %today, "Birthday scan started");

        let due = self.store.find_due_birthdays(today).await.map_err(|e| {
            error!(error = %e, "Due birthday query failed");
            e
        })?;

        let mut report = ScanReport {
            due_entries: due.len(),
            ..ScanReport::default()
        };

        if due.is_empty() {
            info!("No birthdays today");
            telemetry::record_scan(0, 0, started.elapsed().as_secs_f64());
            return Ok(report);
        }

        let reminders = group_due_birthdays(&due);
        report.groups = reminders.len();
        info!(
            due_entries = report.due_entries,
            groups = report.groups,
            "Sending birthday reminders"
        );

        for reminder in &reminders {
            let message = reminder.message();
            match self.sink.send(reminder.group_id, &message).await {
                Ok(()) => {
                    report.sent += 1;
                    info!(
                        group_id = reminder.group_id,
                        names = ?reminder.names,
                        "Birthday reminder sent"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        group_id = reminder.group_id,
                        error = %e,
                        "Failed to send birthday reminder"
                    );
                }
            }
        }

        telemetry::record_scan(report.sent, report.failed, started.elapsed().as_secs_f64());
        info!(
            sent = report.sent,
            failed = report.failed,
            "Birthday scan finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delivery::MockDeliverySink;
    use crate::errors::DeliveryError;
    use crate::store::{InMemoryStore, MockBirthdayStore};
    use mockall::predicate::eq;

    const G1: i64 = -100;
    const G2: i64 = -200;

    fn june_5() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .upsert_birthday(G1, "Alice", "05-06".parse().unwrap())
            .await
            .unwrap();
        store
            .upsert_birthday(G1, "Bob", "05-06".parse().unwrap())
            .await
            .unwrap();
        store
            .upsert_birthday(G2, "Carol", "01-01".parse().unwrap())
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_one_message_per_due_group() {
        let store = seeded_store().await;
        let mut sink = MockDeliverySink::new();
        sink.expect_send()
            .with(eq(G1), eq("🎉 Happy Birthday Alice, Bob! 🎂🥳"))
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = ReminderEngine::new(store, Arc::new(sink));
        let report = engine.run_for_date(june_5()).await.unwrap();

        assert_eq!(
            report,
            ScanReport {
                due_entries: 2,
                groups: 1,
                sent: 1,
                failed: 0,
            }
        );
    }

    #[tokio::test]
    async fn test_disabled_group_gets_nothing() {
        let store = seeded_store().await;
        store.set_enabled(G1, false).await.unwrap();
        let mut sink = MockDeliverySink::new();
        sink.expect_send().never();

        let engine = ReminderEngine::new(store, Arc::new(sink));
        let report = engine.run_for_date(june_5()).await.unwrap();
        assert_eq!(report.groups, 0);
    }

    #[tokio::test]
    async fn test_duplicate_rows_collapse_in_message() {
        let store = seeded_store().await;
        store
            .insert_unchecked(G1, "Alice", "05-06".parse().unwrap())
            .await;
        let mut sink = MockDeliverySink::new();
        sink.expect_send()
            .with(eq(G1), eq("🎉 Happy Birthday Alice, Bob! 🎂🥳"))
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = ReminderEngine::new(store, Arc::new(sink));
        let report = engine.run_for_date(june_5()).await.unwrap();
        assert_eq!(report.due_entries, 3);
        assert_eq!(report.sent, 1);
    }

    #[tokio::test]
    async fn test_send_failure_does_not_stop_other_groups() {
        let store = seeded_store().await;
        store
            .upsert_birthday(G2, "Dave", "05-06".parse().unwrap())
            .await
            .unwrap();

        let mut sink = MockDeliverySink::new();
        sink.expect_send()
            .with(eq(G1), mockall::predicate::always())
            .times(1)
            .returning(|chat_id, _| {
                Err(DeliveryError::SendFailed {
                    chat_id,
                    reason: "Forbidden: bot was kicked".to_string(),
                })
            });
        sink.expect_send()
            .with(eq(G2), eq("🎉 Happy Birthday Dave! 🎂🥳"))
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = ReminderEngine::new(store, Arc::new(sink));
        let report = engine.run_for_date(june_5()).await.unwrap();
        assert_eq!(report.groups, 2);
        assert_eq!(report.sent, 1);
        assert_eq!(report.failed, 1);
    }

    #[tokio::test]
    async fn test_no_due_birthdays_sends_nothing() {
        let store = seeded_store().await;
        let mut sink = MockDeliverySink::new();
        sink.expect_send().never();

        let engine = ReminderEngine::new(store, Arc::new(sink));
        let report = engine
            .run_for_date(NaiveDate::from_ymd_opt(2024, 3, 3).unwrap())
            .await
            .unwrap();
        assert_eq!(report, ScanReport::default());
    }

    #[tokio::test]
    async fn test_query_failure_aborts_scan() {
        let mut store = MockBirthdayStore::new();
        store
            .expect_find_due_birthdays()
            .returning(|_| Err(DatabaseError::QueryFailed("connection refused".to_string())));
        let mut sink = MockDeliverySink::new();
        sink.expect_send().never();

        let engine = ReminderEngine::new(Arc::new(store), Arc::new(sink));
        assert!(engine.run_for_date(june_5()).await.is_err());
    }
}
