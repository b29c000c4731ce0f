// Error handling framework
// One enum per concern; command errors know how to render themselves for chat users.

use thiserror::Error;

/// Schedule-related errors
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCronExpression { expression: String, reason: String },

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("No next execution time available for {schedule_type} schedule")]
    NoNextExecution { schedule_type: String },
}

/// Validation errors for user-supplied command arguments
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Usage: {usage}")]
    Usage { usage: String },

    #[error("Invalid date '{0}'")]
    InvalidDate(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),
}

/// Database-specific errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate key violation: {0}")]
    DuplicateKey(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),
}

/// Errors raised by the chat transport when delivering a message
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Failed to send message to chat {chat_id}: {reason}")]
    SendFailed { chat_id: i64, reason: String },
}

/// Errors produced while executing a chat command
#[derive(Error, Debug)]
pub enum CommandError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No birthday named '{name}' in this group")]
    NotFound { name: String },

    #[error("Store failure during {action}: {source}")]
    Store {
        action: StoreAction,
        #[source]
        source: DatabaseError,
    },
}

/// The store operation a command was performing when it failed.
/// Each action has its own generic reply so users never see internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreAction {
    Add,
    List,
    Remove,
    Enable,
    Disable,
}

impl std::fmt::Display for StoreAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreAction::Add => "add",
            StoreAction::List => "list",
            StoreAction::Remove => "remove",
            StoreAction::Enable => "enable",
            StoreAction::Disable => "disable",
        };
        f.write_str(name)
    }
}

impl CommandError {
    pub fn store(action: StoreAction, source: DatabaseError) -> Self {
        CommandError::Store { action, source }
    }

    /// Text shown to the chat in place of the command result
    pub fn user_message(&self) -> String {
        match self {
            CommandError::Validation(ValidationError::Usage { usage }) => {
                format!("Usage: {}", usage)
            }
            CommandError::Validation(ValidationError::InvalidDate(_)) => {
                "Invalid Date! Please use a valid date in DD-MM format.".to_string()
            }
            CommandError::Validation(ValidationError::InvalidName(reason)) => {
                format!("Invalid name: {}", reason)
            }
            CommandError::NotFound { name } => {
                format!("I couldn't find anyone named '{}' in this group.", name)
            }
            CommandError::Store { action, .. } => match action {
                StoreAction::Add => "Error saving birthday to database".to_string(),
                StoreAction::List => "Could not retrieve birthday list".to_string(),
                StoreAction::Remove => "error removing birthday.".to_string(),
                StoreAction::Enable => "Failed to enable reminders.".to_string(),
                StoreAction::Disable => "Failed to disable reminders.".to_string(),
            },
        }
    }
}

// Implement From for common external errors
impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(db_err) => {
                // Check for specific database error codes
                if let Some(code) = db_err.code() {
                    match code.as_ref() {
                        "23505" => DatabaseError::DuplicateKey(db_err.message().to_string()),
                        _ => DatabaseError::QueryFailed(db_err.message().to_string()),
                    }
                } else {
                    DatabaseError::QueryFailed(db_err.message().to_string())
                }
            }
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DatabaseError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DatabaseError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_error_display() {
        let err = ScheduleError::InvalidCronExpression {
            expression: "* * * *".to_string(),
            reason: "invalid format".to_string(),
        };
        assert!(err.to_string().contains("Invalid cron expression"));
    }

    #[test]
    fn test_usage_error_user_message() {
        let err: CommandError = ValidationError::Usage {
            usage: "/add [name] [DD-MM]".to_string(),
        }
        .into();
        assert_eq!(err.user_message(), "Usage: /add [name] [DD-MM]");
    }

    #[test]
    fn test_invalid_date_user_message() {
        let err: CommandError = ValidationError::InvalidDate("31-02".to_string()).into();
        assert_eq!(
            err.user_message(),
            "Invalid Date! Please use a valid date in DD-MM format."
        );
    }

    #[test]
    fn test_not_found_user_message() {
        let err = CommandError::NotFound {
            name: "Alice".to_string(),
        };
        assert_eq!(
            err.user_message(),
            "I couldn't find anyone named 'Alice' in this group."
        );
    }

    #[test]
    fn test_store_error_hides_details() {
        let err = CommandError::store(
            StoreAction::List,
            DatabaseError::QueryFailed("relation does not exist".to_string()),
        );
        assert_eq!(err.user_message(), "Could not retrieve birthday list");
        assert!(err.to_string().contains("relation does not exist"));
    }

    #[test]
    fn test_delivery_error_display() {
        let err = DeliveryError::SendFailed {
            chat_id: -100,
            reason: "bot was kicked".to_string(),
        };
        assert!(err.to_string().contains("-100"));
    }
}
