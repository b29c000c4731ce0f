// Command gate: decides whether a chat may run a command
//
// Direct chats and control commands always pass. Everything else is checked
// against the group's stored reminder flag on every call, with no caching.

use crate::commands::CommandKind;
use crate::models::{ChatKind, ReminderSetting};
use crate::store::BirthdayStore;
use crate::telemetry;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Notice sent in place of a command refused by a disabled group
pub const DISABLED_NOTICE: &str =
    "Birthday reminders are disabled in this group.\nUse /enable to turn them back on.";

/// Outcome of gating one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Deny { notice: &'static str },
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Commands that stay callable while reminders are disabled
pub fn is_control_command(command: &str) -> bool {
    command
        .parse::<CommandKind>()
        .map(CommandKind::is_control)
        .unwrap_or(false)
}

/// Gate consulted before every command handler
#[derive(Clone)]
pub struct CommandGate {
    store: Arc<dyn BirthdayStore>,
}

impl CommandGate {
    pub fn new(store: Arc<dyn BirthdayStore>) -> Self {
        Self { store }
    }

    /// Decide whether `command` may run in the given chat
    #[instrument(skip(self))]
    pub async fn check(&self, chat_kind: ChatKind, chat_id: i64, command: &str) -> GateDecision {
        if chat_kind == ChatKind::Private {
            return GateDecision::Allow;
        }

        if is_control_command(command) {
            return GateDecision::Allow;
        }

        let setting = match self.store.get_setting(chat_id).await {
            Ok(setting) => setting,
            Err(e) => {
                // Fail open
                warn!(chat_id, error = %e, "Reminder setting lookup failed, allowing command");
                ReminderSetting::NotConfigured
            }
        };

        if setting.is_enabled() {
            GateDecision::Allow
        } else {
            debug!(chat_id, command, "Command denied, reminders disabled");
            telemetry::record_command_denied(command);
            GateDecision::Deny {
                notice: DISABLED_NOTICE,
            }
        }
    }

    /// Boolean form of [`CommandGate::check`]
    pub async fn allow(&self, chat_kind: ChatKind, chat_id: i64, command: &str) -> bool {
        self.check(chat_kind, chat_id, command).await.is_allowed()
    }
}
