// Birthday bot binary entry point
//
// Runs the Telegram command dispatcher and the daily reminder scheduler in
// one process. Ctrl+C stops the dispatcher, then the scheduler.

mod telegram;

use anyhow::Context;
use common::commands::CommandHandler;
use common::config::Settings;
use common::db::DbPool;
use common::delivery::{DeliverySink, TelegramSink};
use common::gate::CommandGate;
use common::reminder::ReminderEngine;
use common::schedule::DailyTrigger;
use common::scheduler::{DailyScheduler, Scheduler};
use common::store::{BirthdayStore, PgStore};
use common::telemetry;
use std::sync::Arc;
use teloxide::prelude::{Bot, Requester};
use telegram::BotState;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    telemetry::init_logging(
        &settings.observability.log_level,
        settings.observability.json_logs,
        settings.observability.tracing_endpoint.as_deref(),
    )?;

    info!("Starting birthday reminder bot");

    if let Some(port) = settings.observability.metrics_port {
        telemetry::init_metrics(port)?;
        info!(port, "Metrics exporter listening");
    }

    info!(
        timezone = %settings.reminder.timezone,
        cron = %settings.reminder.cron,
        max_connections = settings.database.max_connections,
        "Configuration loaded"
    );

    let db_pool = DbPool::new(&settings.database).await.map_err(|e| {
        error!(error = %e, "Failed to initialize database pool");
        e
    })?;
    db_pool
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;
    db_pool
        .health_check()
        .await
        .context("Database health check failed")?;

    let trigger = DailyTrigger::new(&settings.reminder.cron, &settings.reminder.timezone)
        .context("Invalid reminder schedule")?;

    let bot = Bot::new(settings.telegram.token.clone());
    let me = bot.get_me().await.context("Failed to fetch bot identity")?;
    let username = me
        .user
        .username
        .clone()
        .ok_or_else(|| anyhow::anyhow!("Bot account has no username"))?;
    info!(username = %username, "Authenticated with Telegram");

    let store: Arc<dyn BirthdayStore> = Arc::new(PgStore::new(db_pool.clone()));
    let sink: Arc<dyn DeliverySink> = Arc::new(TelegramSink::new(bot.clone()));
    let engine = Arc::new(ReminderEngine::new(store.clone(), sink));
    let scheduler = Arc::new(DailyScheduler::new(trigger, engine));

    let mut scheduler_task = {
        let scheduler = scheduler.clone();
        tokio::spawn(async move { scheduler.start().await })
    };

    let state = Arc::new(BotState::new(
        username,
        CommandGate::new(store.clone()),
        CommandHandler::new(store),
    ));

    info!("Listening for commands");
    let scheduler_exit = tokio::select! {
        _ = telegram::run_dispatcher(bot, state) => None,
        joined = &mut scheduler_task => Some(joined),
    };

    let outcome = match scheduler_exit {
        None => {
            info!("Dispatcher stopped, initiating graceful shutdown");
            scheduler.stop().await;
            match scheduler_task.await {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("Reminder scheduler failed")),
                Err(e) => Err(anyhow::Error::new(e).context("Reminder scheduler task panicked")),
            }
        }
        // Scheduler ended before the dispatcher
        Some(joined) => {
            error!("Reminder scheduler exited, shutting down");
            match joined {
                Ok(Ok(())) => Err(anyhow::anyhow!("Reminder scheduler exited unexpectedly")),
                Ok(Err(e)) => Err(anyhow::Error::new(e).context("Reminder scheduler failed")),
                Err(e) => Err(anyhow::Error::new(e).context("Reminder scheduler task panicked")),
            }
        }
    };

    db_pool.close().await;
    telemetry::shutdown_tracer();

    info!("Birthday reminder bot stopped");
    outcome
}
