// Chat command parsing and handlers
//
// Handlers return the reply text for the chat. Every failure maps to a fixed
// user-facing message; store failures are logged with their cause first.

use crate::errors::{CommandError, StoreAction, ValidationError};
use crate::models::DayMonth;
use crate::store::BirthdayStore;
use crate::telemetry;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info, instrument};

const MAX_NAME_CHARS: usize = 64;

pub const START_TEXT: &str = "Welcome to the Birthday Reminder Bot!\n\n\
Use /add [name] [DD-MM] to save a birthday for this group.\n";

pub const HELP_TEXT: &str = "<b>Birthday Reminder Bot Commands!</b>

<b>Setup and Information</b>
•/add [name] [DD-MM] - Add or update a birthday
•/list - List all saved birthdays
•/remove [name] - Remove a birthday

<b>Notification Control</b>
•/enable - Enable birthday reminders in this group
•/disable - Disable birthday reminders in this group

<b>General</b>
•/help - Show this help message

Note: Birthday Reminders are specific to this group only.";

pub const HELLO_TEXT: &str = "Hello! I'm the Birthday Reminder Bot.";

/// Commands the bot answers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Start,
    Help,
    Hello,
    Add,
    List,
    Remove,
    Enable,
    Disable,
}

impl CommandKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CommandKind::Start => "start",
            CommandKind::Help => "help",
            CommandKind::Hello => "hello",
            CommandKind::Add => "add",
            CommandKind::List => "list",
            CommandKind::Remove => "remove",
            CommandKind::Enable => "enable",
            CommandKind::Disable => "disable",
        }
    }

    /// Control commands can never be locked by disabling reminders
    pub fn is_control(self) -> bool {
        matches!(
            self,
            CommandKind::Enable | CommandKind::Disable | CommandKind::Help | CommandKind::Start
        )
    }
}

impl FromStr for CommandKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(CommandKind::Start),
            "help" => Ok(CommandKind::Help),
            "hello" => Ok(CommandKind::Hello),
            "add" => Ok(CommandKind::Add),
            "list" => Ok(CommandKind::List),
            "remove" => Ok(CommandKind::Remove),
            "enable" => Ok(CommandKind::Enable),
            "disable" => Ok(CommandKind::Disable),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `/command arg1 arg2` message split into its parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Lowercased command name without the leading slash or `@botname`
    pub name: String,
    pub args: Vec<String>,
}

impl CommandInvocation {
    /// Split message text into a command invocation for the bot named
    /// `bot_username`.
    ///
    /// Returns `None` for text that is not a command and for commands
    /// addressed to another bot (`/list@OtherBot`). Mentions compare
    /// case-insensitively.
    pub fn parse(text: &str, bot_username: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let head = tokens.next()?.strip_prefix('/')?;
        let (command, mention) = match head.split_once('@') {
            Some((command, mention)) => (command, Some(mention)),
            None => (head, None),
        };
        if let Some(mention) = mention {
            if !mention.eq_ignore_ascii_case(bot_username.trim_start_matches('@')) {
                return None;
            }
        }

        let name = command.to_lowercase();
        if name.is_empty() {
            return None;
        }

        Some(Self {
            name,
            args: tokens.map(str::to_string).collect(),
        })
    }

    /// The command this invocation names, if the bot knows it
    pub fn kind(&self) -> Option<CommandKind> {
        self.name.parse().ok()
    }
}

/// How a reply should be rendered by the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    Plain,
    Html,
}

/// Text sent back to the chat that issued a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }

    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Html,
        }
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::plain(err.user_message())
    }
}

/// Escape text for Telegram's HTML parse mode
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn require_args<'a>(
    args: &'a [String],
    expected: usize,
    usage: &str,
) -> Result<&'a [String], ValidationError> {
    if args.len() != expected {
        return Err(ValidationError::Usage {
            usage: usage.to_string(),
        });
    }
    Ok(args)
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(ValidationError::InvalidName(format!(
            "names are limited to {} characters",
            MAX_NAME_CHARS
        )));
    }
    Ok(())
}

/// Executes commands against the record store
#[derive(Clone)]
pub struct CommandHandler {
    store: Arc<dyn BirthdayStore>,
}

impl CommandHandler {
    pub fn new(store: Arc<dyn BirthdayStore>) -> Self {
        Self { store }
    }

    /// Run one command for a chat and produce its reply.
    /// Failures are already rendered as user-facing replies.
    #[instrument(skip(self, args))]
    pub async fn handle(&self, chat_id: i64, kind: CommandKind, args: &[String]) -> Reply {
        telemetry::record_command_handled(kind.as_str());

        let result = match kind {
            CommandKind::Start => Ok(Reply::plain(START_TEXT)),
            CommandKind::Help => Ok(Reply::html(HELP_TEXT)),
            CommandKind::Hello => Ok(Reply::plain(HELLO_TEXT)),
            CommandKind::Add => self.add(chat_id, args).await.map(Reply::plain),
            CommandKind::List => self.list(chat_id).await.map(Reply::html),
            CommandKind::Remove => self.remove(chat_id, args).await.map(Reply::plain),
            CommandKind::Enable => self.enable(chat_id).await.map(Reply::plain),
            CommandKind::Disable => self.disable(chat_id).await.map(Reply::plain),
        };

        result.unwrap_or_else(|err| {
            if let CommandError::Store { .. } = &err {
                error!(chat_id, error = %err, "Command failed on store access");
            }
            Reply::from(err)
        })
    }

    /// `/add <name> <DD-MM>`
    pub async fn add(&self, group_id: i64, args: &[String]) -> Result<String, CommandError> {
        let args = require_args(args, 2, "/add [name] [DD-MM]")?;
        let name = args[0].as_str();
        validate_name(name)?;
        let date: DayMonth = args[1].parse()?;

        self.store
            .upsert_birthday(group_id, name, date)
            .await
            .map_err(|e| CommandError::store(StoreAction::Add, e))?;

        info!(group_id, name, date = %date, "Birthday added");
        Ok(format!("Added {}'s birthday on {} to list!", name, date))
    }

    /// `/list`
    pub async fn list(&self, group_id: i64) -> Result<String, CommandError> {
        let birthdays = self
            .store
            .find_by_group(group_id)
            .await
            .map_err(|e| CommandError::store(StoreAction::List, e))?;

        if birthdays.is_empty() {
            return Ok("no birthdays in list yet. Use /add to start!".to_string());
        }

        let mut message = String::from("🎂 <b>Birthdays:</b>\n\n");
        for birthday in &birthdays {
            message.push_str(&format!(
                "- {}: {}\n",
                html_escape(&birthday.name),
                birthday.day_month()
            ));
        }
        Ok(message)
    }

    /// `/remove <name>`
    pub async fn remove(&self, group_id: i64, args: &[String]) -> Result<String, CommandError> {
        let args = require_args(args, 1, "/remove [name]")?;
        let name = args[0].as_str();

        let removed = self
            .store
            .delete_birthday(group_id, name)
            .await
            .map_err(|e| CommandError::store(StoreAction::Remove, e))?;

        if removed == 0 {
            return Err(CommandError::NotFound {
                name: name.to_string(),
            });
        }

        info!(group_id, name, "Birthday removed");
        Ok(format!("Removed {}'s birthday from list!", name))
    }

    /// `/enable`
    pub async fn enable(&self, group_id: i64) -> Result<String, CommandError> {
        self.store
            .set_enabled(group_id, true)
            .await
            .map_err(|e| CommandError::store(StoreAction::Enable, e))?;
        Ok("Birthday Reminders are now enabled for this group!".to_string())
    }

    /// `/disable`
    pub async fn disable(&self, group_id: i64) -> Result<String, CommandError> {
        self.store
            .set_enabled(group_id, false)
            .await
            .map_err(|e| CommandError::store(StoreAction::Disable, e))?;
        Ok("Birthday Reminders are now disabled for this group.".to_string())
    }
}
