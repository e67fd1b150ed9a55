use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::Serialize;

use crate::model::{Period, Task};

/// Completion percentages, each rounded to the nearest integer in `0..=100`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub daily: u32,
    pub weekly: u32,
    pub monthly: u32,
    pub goal: u32,
}

/// The current daily, weekly and monthly windows, in the time zone of the
/// instant they were built from.
pub struct Windows<Tz: TimeZone> {
    tz: Tz,
    today: NaiveDate,
    week_start: NaiveDateTime,
    month_start: NaiveDateTime,
}

impl<Tz: TimeZone> Windows<Tz> {
    pub fn at(now: &DateTime<Tz>) -> Self {
        let today = now.date_naive();
        Self {
            tz: now.timezone(),
            today,
            week_start: start_of_week(today).and_time(NaiveTime::MIN),
            month_start: start_of_month(today).and_time(NaiveTime::MIN),
        }
    }

    /// Whether `task` counts toward its own period's window.
    pub fn contains(&self, task: &Task) -> bool {
        let local = task.date.with_timezone(&self.tz).naive_local();
        match task.period {
            Period::Daily => local.date() == self.today,
            Period::Weekly => local >= self.week_start,
            Period::Monthly => local >= self.month_start,
        }
    }
}

/// Monday of the week containing `day`; Sunday belongs to the week that
/// started six days earlier.
pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

pub fn start_of_month(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.day0()))
}

fn percentage(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    // round-half-up of 100 * completed / total in integer arithmetic
    ((completed * 200 + total) / (total * 2)) as u32
}

fn ratio<'a>(tasks: impl Iterator<Item = &'a Task>) -> u32 {
    let (completed, total) = tasks.fold((0, 0), |(c, n), t| (c + usize::from(t.completed), n + 1));
    percentage(completed, total)
}

pub fn compute_progress<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> Progress {
    let windows = Windows::at(now);
    let windowed = |period: Period| {
        ratio(
            tasks
                .iter()
                .filter(|t| t.period == period && windows.contains(t)),
        )
    };
    Progress {
        daily: windowed(Period::Daily),
        weekly: windowed(Period::Weekly),
        monthly: windowed(Period::Monthly),
        goal: ratio(tasks.iter()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn task(id: &str, period: Period, date: &str, completed: bool) -> Task {
        let mut t = Task::new(id, id, period, at(date));
        t.completed = completed;
        t
    }

    // Wednesday
    const NOW: &str = "2025-03-12T15:00:00Z";

    #[test]
    fn week_starts_on_monday() {
        let wed = NaiveDate::from_ymd_opt(2025, 3, 12).unwrap();
        let mon = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let sun = NaiveDate::from_ymd_opt(2025, 3, 16).unwrap();
        assert_eq!(start_of_week(wed), mon);
        assert_eq!(start_of_week(mon), mon);
        assert_eq!(start_of_week(sun), mon);
    }

    #[test]
    fn month_start() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(start_of_month(day), NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[test]
    fn daily_half_done() {
        let tasks = vec![
            task("a", Period::Daily, "2025-03-12T08:00:00Z", true),
            task("b", Period::Daily, "2025-03-12T20:00:00Z", false),
        ];
        assert_eq!(compute_progress(&tasks, &at(NOW)).daily, 50);
    }

    #[test]
    fn daily_window_is_calendar_day_not_24h() {
        let tasks = vec![
            task("yesterday-late", Period::Daily, "2025-03-11T23:30:00Z", true),
            task("today-early", Period::Daily, "2025-03-12T00:10:00Z", false),
        ];
        // only today's task counts, and it is open
        assert_eq!(compute_progress(&tasks, &at(NOW)).daily, 0);
        let tasks = vec![task("yesterday-late", Period::Daily, "2025-03-11T23:30:00Z", true)];
        assert_eq!(compute_progress(&tasks, &at(NOW)).daily, 0);
    }

    #[test]
    fn daily_window_follows_time_zone_of_now() {
        // 23:30 UTC on the 11th is 01:30 on the 12th at UTC+2
        let tasks = vec![task("a", Period::Daily, "2025-03-11T23:30:00Z", true)];
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at(NOW).with_timezone(&plus_two);
        assert_eq!(compute_progress(&tasks, &now).daily, 100);
        assert_eq!(compute_progress(&tasks, &at(NOW)).daily, 0);
    }

    #[test]
    fn weekly_window_from_monday_midnight() {
        let tasks = vec![
            task("mon", Period::Weekly, "2025-03-10T00:00:00Z", true),
            task("next-week", Period::Weekly, "2025-03-18T00:00:00Z", false),
            task("last-week", Period::Weekly, "2025-03-09T23:59:00Z", false),
        ];
        // last week is excluded, future weeks are not
        assert_eq!(compute_progress(&tasks, &at(NOW)).weekly, 50);
    }

    #[test]
    fn monthly_window_from_first_of_month() {
        let tasks = vec![
            task("feb", Period::Monthly, "2025-02-28T12:00:00Z", false),
            task("mar", Period::Monthly, "2025-03-01T00:00:00Z", true),
            task("mar2", Period::Monthly, "2025-03-20T00:00:00Z", true),
        ];
        assert_eq!(compute_progress(&tasks, &at(NOW)).monthly, 100);
    }

    #[test]
    fn goal_counts_everything() {
        let tasks = vec![
            task("a", Period::Monthly, "2020-01-01T00:00:00Z", true),
            task("b", Period::Weekly, "2030-01-01T00:00:00Z", false),
            task("c", Period::Daily, "2025-03-12T09:00:00Z", false),
        ];
        assert_eq!(compute_progress(&tasks, &at(NOW)).goal, 33);
    }

    #[test]
    fn empty_windows_are_zero() {
        assert_eq!(compute_progress(&[], &at(NOW)), Progress::default());
        // a weekly task does not count toward the daily window
        let tasks = vec![task("w", Period::Weekly, "2025-03-12T09:00:00Z", true)];
        let p = compute_progress(&tasks, &at(NOW));
        assert_eq!(p.daily, 0);
        assert_eq!(p.monthly, 0);
        assert_eq!(p.weekly, 100);
    }

    #[test]
    fn rounds_to_nearest() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
    }

    #[test]
    fn always_within_bounds() {
        for total in 1..40 {
            for done in 0..=total {
                let p = percentage(done, total);
                assert!(p <= 100);
            }
        }
    }
}
