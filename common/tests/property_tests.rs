// Property-based tests for dates, grouping and scheduling

use chrono::{Datelike, NaiveDate, TimeZone, Timelike, Utc};
use common::commands::{CommandHandler, CommandKind};
use common::models::{Birthday, DayMonth};
use common::reminder::group_due_birthdays;
use common::schedule::DailyTrigger;
use common::store::{BirthdayStore, InMemoryStore};
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// *For any* two-digit day and month, parsing succeeds exactly when the
/// pair names a real calendar day (29-02 included).
#[test]
fn property_day_month_accepts_only_real_dates() {
    proptest!(|(day in 0u32..100, month in 0u32..100)| {
        let input = format!("{:02}-{:02}", day, month);
        let parsed = input.parse::<DayMonth>();
        let real = NaiveDate::from_ymd_opt(2024, month, day).is_some();

        prop_assert_eq!(parsed.is_ok(), real);
        if let Ok(date) = parsed {
            prop_assert_eq!(date.to_string(), input);
        }
    });
}

/// *For any* rejected date, `/add` writes nothing
#[test]
fn property_invalid_date_never_stored() {
    let rt = runtime();
    proptest!(|(day in 32u32..100, month in 1u32..13, name in "[A-Za-z]{1,12}")| {
        let stored = rt.block_on(async {
            let store = Arc::new(InMemoryStore::new());
            let handler = CommandHandler::new(store.clone());
            let args = vec![name.clone(), format!("{:02}-{:02}", day, month)];
            let reply = handler.handle(-1, CommandKind::Add, &args).await;
            assert!(reply.text.starts_with("Invalid Date!"));
            store.birthday_count().await
        });
        prop_assert_eq!(stored, 0);
    });
}

/// *For any* sequence of additions, a group holds one row per distinct
/// name, carrying the last date given for it.
#[test]
fn property_upsert_keeps_one_row_per_name() {
    let rt = runtime();
    let names = prop::sample::select(vec!["Alice", "Bob", "Carol"]);
    proptest!(|(adds in prop::collection::vec((names, 1u32..29, 1u32..13), 1..20))| {
        let rows = rt.block_on(async {
            let store = InMemoryStore::new();
            for (name, day, month) in &adds {
                let date = DayMonth::new(*day, *month).unwrap();
                store.upsert_birthday(-7, name, date).await.unwrap();
            }
            store.find_by_group(-7).await.unwrap()
        });

        let distinct: HashSet<&str> = adds.iter().map(|(name, _, _)| *name).collect();
        prop_assert_eq!(rows.len(), distinct.len());

        for row in &rows {
            let (_, day, month) = adds
                .iter()
                .rev()
                .find(|(n, _, _)| *n == row.name)
                .unwrap();
            prop_assert_eq!((row.day, row.month), (*day as i32, *month as i32));
        }
    });
}

/// *For any* due list, every group gets one reminder whose names are
/// distinct and cover exactly the names due in that group.
#[test]
fn property_grouping_covers_each_group_once() {
    let entry = (
        prop::sample::select(vec![-1i64, -2, -3]),
        prop::sample::select(vec!["Ann", "Ben", "Cy"]),
    );
    proptest!(|(entries in prop::collection::vec(entry, 0..30))| {
        let due: Vec<Birthday> = entries
            .iter()
            .enumerate()
            .map(|(i, (group_id, name))| Birthday {
                id: i as i64,
                group_id: *group_id,
                name: name.to_string(),
                day: 5,
                month: 6,
            })
            .collect();

        let reminders = group_due_birthdays(&due);

        let groups: HashSet<i64> = reminders.iter().map(|r| r.group_id).collect();
        prop_assert_eq!(groups.len(), reminders.len());

        for reminder in &reminders {
            prop_assert!(!reminder.names.is_empty());
            let unique: HashSet<&String> = reminder.names.iter().collect();
            prop_assert_eq!(unique.len(), reminder.names.len());

            let expected: HashSet<String> = due
                .iter()
                .filter(|b| b.group_id == reminder.group_id)
                .map(|b| b.name.clone())
                .collect();
            prop_assert_eq!(unique.into_iter().cloned().collect::<HashSet<_>>(), expected);
        }

        let due_groups: HashSet<i64> = due.iter().map(|b| b.group_id).collect();
        prop_assert_eq!(groups, due_groups);
    });
}

/// *For any* instant, the next fire is later, within a day, and lands on
/// 00:05 local time.
#[test]
fn property_next_fire_is_next_local_0005() {
    let trigger = DailyTrigger::new("0 5 0 * * *", "Asia/Kolkata").unwrap();
    proptest!(|(offset in 0i64..(4 * 365 * 86_400))| {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let now = base + chrono::Duration::seconds(offset);

        let next = trigger.next_after(now).unwrap();
        prop_assert!(next > now);
        prop_assert!(next - now <= chrono::Duration::days(1));

        let local = next.with_timezone(&trigger.timezone());
        prop_assert_eq!((local.hour(), local.minute(), local.second()), (0, 5, 0));

        // Consecutive fires fall on consecutive local dates
        let after = trigger.next_after(next).unwrap();
        let gap = trigger.local_date(after).num_days_from_ce()
            - trigger.local_date(next).num_days_from_ce();
        prop_assert_eq!(gap, 1);
    });
}
