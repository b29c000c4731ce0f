// Configuration management with layered configuration (.env, file, env)

use crate::schedule::DailyTrigger;
use chrono::Utc;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub reminder: ReminderConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_seconds: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub token: String,
}

// Keeps the bot token out of logs
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderConfig {
    /// Six-field cron expression (seconds first) evaluated in `timezone`
    pub cron: String,
    /// IANA zone name used for every date calculation
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    pub log_level: String,
    #[serde(default = "default_json_logs")]
    pub json_logs: bool,
    pub metrics_port: Option<u16>,
    pub tracing_endpoint: Option<String>,
}

fn default_json_logs() -> bool {
    true
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        // A missing .env file is fine; real deployments set the environment directly
        let _ = dotenvy::dotenv();
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();
        let defaults = Settings::default();

        let builder = Config::builder()
            .set_default("database.url", defaults.database.url)?
            .set_default("database.max_connections", defaults.database.max_connections)?
            .set_default("database.min_connections", defaults.database.min_connections)?
            .set_default(
                "database.connect_timeout_seconds",
                defaults.database.connect_timeout_seconds,
            )?
            .set_default("telegram.token", defaults.telegram.token)?
            .set_default("reminder.cron", defaults.reminder.cron)?
            .set_default("reminder.timezone", defaults.reminder.timezone)?
            .set_default("observability.log_level", defaults.observability.log_level)?
            .set_default("observability.json_logs", defaults.observability.json_logs)?
            // Start with default configuration
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            // Plain variables used by older deployments
            .set_override_option("database.url", std::env::var("DB_DSN").ok())?
            .set_override_option("telegram.token", std::env::var("TOKEN").ok())?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.is_empty() {
            return Err("Database URL cannot be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.database.min_connections > self.database.max_connections {
            return Err(
                "Database min_connections cannot exceed max_connections".to_string(),
            );
        }

        if self.telegram.token.trim().is_empty() {
            return Err("Telegram bot token cannot be empty".to_string());
        }

        // The schedule must still have a fire time ahead
        let trigger = DailyTrigger::new(&self.reminder.cron, &self.reminder.timezone)
            .map_err(|e| e.to_string())?;
        trigger.next_after(Utc::now()).map_err(|e| e.to_string())?;

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/birthday_bot".to_string(),
                max_connections: 10,
                min_connections: 1,
                connect_timeout_seconds: 30,
            },
            telegram: TelegramConfig {
                token: String::new(),
            },
            reminder: ReminderConfig {
                cron: "0 5 0 * * *".to_string(),
                timezone: "Asia/Kolkata".to_string(),
            },
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
                json_logs: true,
                metrics_port: None,
                tracing_endpoint: None,
            },
        }
    }
}
