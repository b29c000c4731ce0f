// Daily scheduler loop
//
// Fires the reminder job once per local calendar day. Runs are awaited
// inline, so a new run can never start while the previous one is in flight.
// A fire time missed while the process was down is not caught up.

use crate::errors::{DatabaseError, ScheduleError};
use crate::reminder::{ReminderEngine, ScanReport};
use crate::schedule::DailyTrigger;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, instrument, warn};

/// Work performed on each fire
#[async_trait]
pub trait ReminderJob: Send + Sync {
    async fn run(&self, date: NaiveDate) -> Result<ScanReport, DatabaseError>;
}

#[async_trait]
impl ReminderJob for ReminderEngine {
    async fn run(&self, date: NaiveDate) -> Result<ScanReport, DatabaseError> {
        self.run_for_date(date).await
    }
}

/// Scheduler trait for the daily reminder loop
#[async_trait]
pub trait Scheduler: Send + Sync {
    /// Run the loop until [`Scheduler::stop`] is called
    async fn start(&self) -> Result<(), ScheduleError>;

    /// Stop the loop; an in-flight run finishes first
    async fn stop(&self);
}

#[derive(Debug, Default)]
struct FireState {
    last_fire: Option<DateTime<Utc>>,
    last_run_date: Option<NaiveDate>,
}

/// Fires a [`ReminderJob`] on a [`DailyTrigger`]
pub struct DailyScheduler {
    trigger: DailyTrigger,
    job: Arc<dyn ReminderJob>,
    state: Mutex<FireState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl DailyScheduler {
    pub fn new(trigger: DailyTrigger, job: Arc<dyn ReminderJob>) -> Self {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        Self {
            trigger,
            job,
            state: Mutex::new(FireState::default()),
            shutdown_tx,
        }
    }

    /// Get a shutdown signal receiver
    pub fn shutdown_receiver(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Next fire instant, never at or before the previous fire
    pub async fn next_fire(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ScheduleError> {
        let state = self.state.lock().await;
        let reference = match state.last_fire {
            Some(last) if last > now => last,
            _ => now,
        };
        self.trigger.next_after(reference)
    }

    /// Handle one fire at `fired_at`.
    ///
    /// Returns `None` when a run already happened for that local date.
    #[instrument(skip(self))]
    pub async fn fire(&self, fired_at: DateTime<Utc>) -> Option<Result<ScanReport, DatabaseError>> {
        let date = self.trigger.local_date(fired_at);
        {
            let mut state = self.state.lock().await;
            state.last_fire = Some(fired_at);
            if state.last_run_date == Some(date) {
                warn!(date = %date, "Reminder scan already ran for this date, skipping");
                return None;
            }
            state.last_run_date = Some(date);
        }

        let result = self.job.run(date).await;
        match &result {
            Ok(report) => info!(
                date = %date,
                groups = report.groups,
                sent = report.sent,
                failed = report.failed,
                "Reminder scan completed"
            ),
            Err(e) => error!(date = %date, error = %e, "Reminder scan failed"),
        }
        Some(result)
    }
}

#[async_trait]
impl Scheduler for DailyScheduler {
    #[instrument(skip(self))]
    async fn start(&self) -> Result<(), ScheduleError> {
        info!(timezone = %self.trigger.timezone(), "Starting daily reminder scheduler");
        let mut shutdown_rx = self.shutdown_receiver();

        loop {
            let next = self.next_fire(Utc::now()).await?;
            let wait = (next - Utc::now()).to_std().unwrap_or_default();
            debug!(next_fire = %next, wait_seconds = wait.as_secs(), "Waiting for next fire");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    self.fire(next).await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received, stopping scheduler");
                    break;
                }
            }
        }

        info!("Daily reminder scheduler stopped");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn stop(&self) {
        info!("Stopping daily reminder scheduler");
        let _ = self.shutdown_tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct CountingJob {
        runs: AtomicUsize,
        dates: std::sync::Mutex<Vec<NaiveDate>>,
    }

    #[async_trait]
    impl ReminderJob for CountingJob {
        async fn run(&self, date: NaiveDate) -> Result<ScanReport, DatabaseError> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.dates.lock().unwrap().push(date);
            Ok(ScanReport::default())
        }
    }

    fn scheduler(job: Arc<CountingJob>) -> DailyScheduler {
        let trigger = DailyTrigger::new("0 5 0 * * *", "Asia/Kolkata").unwrap();
        DailyScheduler::new(trigger, job)
    }

    #[tokio::test]
    async fn test_fire_uses_local_date() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job.clone());

        // 18:35 UTC on June 4 is 00:05 on June 5 in Kolkata
        let fired_at = Utc.with_ymd_and_hms(2024, 6, 4, 18, 35, 0).unwrap();
        assert!(scheduler.fire(fired_at).await.is_some());

        assert_eq!(
            job.dates.lock().unwrap().as_slice(),
            &[NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()]
        );
    }

    #[tokio::test]
    async fn test_at_most_once_per_day() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job.clone());

        let fired_at = Utc.with_ymd_and_hms(2024, 6, 4, 18, 35, 0).unwrap();
        assert!(scheduler.fire(fired_at).await.is_some());
        assert!(scheduler
            .fire(fired_at + chrono::Duration::minutes(1))
            .await
            .is_none());
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);

        let next_day = Utc.with_ymd_and_hms(2024, 6, 5, 18, 35, 0).unwrap();
        assert!(scheduler.fire(next_day).await.is_some());
        assert_eq!(job.runs.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_next_fire_never_repeats_last_fire() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job);

        let fired_at = Utc.with_ymd_and_hms(2024, 6, 4, 18, 35, 0).unwrap();
        scheduler.fire(fired_at).await;

        // A clock reading slightly behind the fire time must not yield it again
        let early_clock = fired_at - chrono::Duration::seconds(2);
        let next = scheduler.next_fire(early_clock).await.unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 5, 18, 35, 0).unwrap());
    }

    #[tokio::test]
    async fn test_missed_fire_is_not_caught_up() {
        let job = Arc::new(CountingJob::default());
        let scheduler = scheduler(job);

        // Process starts at 09:00 IST, after today's 00:05 fire
        let startup = Utc.with_ymd_and_hms(2024, 6, 5, 3, 30, 0).unwrap();
        let next = scheduler.next_fire(startup).await.unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2024, 6, 5, 18, 35, 0).unwrap());
    }

    #[tokio::test]
    async fn test_stop_ends_loop() {
        let job = Arc::new(CountingJob::default());
        let scheduler = Arc::new(scheduler(job.clone()));

        let runner = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.start().await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        scheduler.stop().await;

        let result = tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .expect("scheduler did not stop")
            .expect("scheduler task panicked");
        assert!(result.is_ok());
        assert_eq!(job.runs.load(Ordering::SeqCst), 0);
    }
}
