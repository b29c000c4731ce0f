// Grouping of due birthdays into per-group reminders

use crate::models::Birthday;
use std::collections::{HashMap, HashSet};

/// Names due today in one group, each listed once in first-seen order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupReminder {
    pub group_id: i64,
    pub names: Vec<String>,
}

impl GroupReminder {
    pub fn message(&self) -> String {
        format_reminder(&self.names)
    }
}

/// Group birthdays by chat, dropping repeated names within a group.
///
/// Groups come out in the order their first entry appears in `birthdays`.
/// Groups without names are never produced.
pub fn group_due_birthdays(birthdays: &[Birthday]) -> Vec<GroupReminder> {
    let mut reminders: Vec<GroupReminder> = Vec::new();
    let mut index_by_group: HashMap<i64, usize> = HashMap::new();
    let mut seen: HashSet<(i64, &str)> = HashSet::new();

    for birthday in birthdays {
        if !seen.insert((birthday.group_id, birthday.name.as_str())) {
            continue;
        }

        let index = *index_by_group.entry(birthday.group_id).or_insert_with(|| {
            reminders.push(GroupReminder {
                group_id: birthday.group_id,
                names: Vec::new(),
            });
            reminders.len() - 1
        });
        reminders[index].names.push(birthday.name.clone());
    }

    reminders
}

/// The celebratory message for a set of names
pub fn format_reminder(names: &[String]) -> String {
    format!("🎉 Happy Birthday {}! 🎂🥳", names.join(", "))
}
