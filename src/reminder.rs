use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::model::Task;

/// How often reminders are scanned; also the width of the window in which a
/// reminder counts as due, so each one fires on exactly one scan.
pub const SCAN_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

fn window() -> Duration {
    Duration::seconds(SCAN_INTERVAL.as_secs() as i64)
}

/// When `task` wants its reminder, if it has one.
pub fn reminder_at(task: &Task) -> Option<DateTime<Utc>> {
    match task.reminder_minutes {
        Some(m) if m > 0 && !task.completed => Some(task.date - Duration::minutes(i64::from(m))),
        _ => None,
    }
}

/// Incomplete tasks whose reminder is due on this scan:
/// `reminder <= now < reminder + SCAN_INTERVAL`.
pub fn due_reminders(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|t| {
            reminder_at(t).is_some_and(|at| now >= at && now < at + window())
        })
        .collect()
}

pub fn reminder_message(task: &Task) -> String {
    format!("It's time to start: \"{}\"", task.title)
}

/// Remembers which reminders were already announced, so a rescan inside the
/// same window stays quiet. A task whose date or lead time changes gets a
/// new reminder instant and is announced again.
#[derive(Debug, Default)]
pub struct ReminderLog {
    announced: HashSet<(String, DateTime<Utc>)>,
}

impl ReminderLog {
    /// Due reminders not yet announced; marks them announced.
    pub fn take_due<'a>(&mut self, tasks: &'a [Task], now: DateTime<Utc>) -> Vec<&'a Task> {
        self.announced.retain(|(_, at)| now < *at + window());
        due_reminders(tasks, now)
            .into_iter()
            .filter(|t| match reminder_at(t) {
                Some(at) => self.announced.insert((t.id.clone(), at)),
                None => false,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Period;

    fn due_at(id: &str, date: &str, minutes: Option<u32>) -> Task {
        let mut t = Task::new(id, format!("Task {id}"), Period::Daily, date.parse().unwrap());
        t.reminder_minutes = minutes;
        t
    }

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn fires_within_one_minute_window() {
        let tasks = vec![due_at("a", "2025-03-12T10:00:00Z", Some(15))];
        assert!(due_reminders(&tasks, at("2025-03-12T09:44:59Z")).is_empty());
        assert_eq!(due_reminders(&tasks, at("2025-03-12T09:45:00Z")).len(), 1);
        assert_eq!(due_reminders(&tasks, at("2025-03-12T09:45:59Z")).len(), 1);
        assert!(due_reminders(&tasks, at("2025-03-12T09:46:00Z")).is_empty());
    }

    #[test]
    fn skips_completed_and_unset() {
        let mut done = due_at("a", "2025-03-12T10:00:00Z", Some(5));
        done.completed = true;
        let tasks = vec![
            done,
            due_at("b", "2025-03-12T10:00:00Z", None),
            due_at("c", "2025-03-12T10:00:00Z", Some(0)),
            due_at("d", "2025-03-12T10:00:00Z", Some(5)),
        ];
        let due = due_reminders(&tasks, at("2025-03-12T09:55:30Z"));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "d");
        assert_eq!(reminder_message(due[0]), "It's time to start: \"Task d\"");
    }

    #[test]
    fn day_before_reminder() {
        let task = due_at("a", "2025-03-12T10:00:00Z", Some(1440));
        assert_eq!(reminder_at(&task), Some(at("2025-03-11T10:00:00Z")));
    }

    #[test]
    fn log_announces_each_reminder_once() {
        let mut tasks = vec![due_at("a", "2025-03-12T10:00:00Z", Some(15))];
        let mut log = ReminderLog::default();

        assert_eq!(log.take_due(&tasks, at("2025-03-12T09:45:05Z")).len(), 1);
        assert!(log.take_due(&tasks, at("2025-03-12T09:45:20Z")).is_empty());

        tasks.push(due_at("b", "2025-03-12T10:00:00Z", Some(15)));
        let due = log.take_due(&tasks, at("2025-03-12T09:45:40Z"));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].id, "b");
    }

    #[test]
    fn log_forgets_expired_windows() {
        let mut tasks = vec![due_at("a", "2025-03-12T10:00:00Z", Some(15))];
        let mut log = ReminderLog::default();
        assert_eq!(log.take_due(&tasks, at("2025-03-12T09:45:00Z")).len(), 1);
        assert!(log.take_due(&tasks, at("2025-03-12T09:47:00Z")).is_empty());
        assert!(log.announced.is_empty());

        // Rescheduled: a new reminder instant is announced again.
        tasks[0].date = at("2025-03-12T10:05:00Z");
        assert_eq!(log.take_due(&tasks, at("2025-03-12T09:50:10Z")).len(), 1);
    }
}
