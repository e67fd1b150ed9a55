//! Completion streaks over calendar days.
//!
//! Completions are walked from the most recent backwards. The current streak
//! only exists if the latest completion fell today or yesterday, and it stops
//! growing at the first gap; later (older) runs only feed the longest streak.
//! Several completions on one calendar day count as that single day.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::model::{Task, UserStats};

#[derive(Debug, Default)]
struct Walk {
    current: u32,
    longest: u32,
    run: u32,
    counting: bool,
    last: Option<NaiveDate>,
}

impl Walk {
    fn step(&mut self, today: NaiveDate, day: NaiveDate) {
        let Some(prev) = self.last else {
            if matches!((today - day).num_days(), 0 | 1) {
                self.run = 1;
                self.current = 1;
                self.counting = true;
            }
            self.last = Some(day);
            return;
        };
        match (prev - day).num_days() {
            1 => {
                self.run += 1;
                if self.counting {
                    self.current += 1;
                }
            }
            gap if gap > 1 => {
                self.longest = self.longest.max(self.run);
                self.run = 1;
                self.counting = false;
            }
            _ => {}
        }
        self.last = Some(day);
    }

    fn finish(self) -> (u32, u32) {
        let longest = self.longest.max(self.run).max(self.current);
        (self.current, longest)
    }
}

/// `(current, longest)` for completion days sorted most recent first.
pub fn streaks(today: NaiveDate, days: impl IntoIterator<Item = NaiveDate>) -> (u32, u32) {
    let mut walk = Walk::default();
    for day in days {
        walk.step(today, day);
    }
    walk.finish()
}

/// Aggregate completion statistics as seen from `now`. Calendar days are
/// taken in the time zone of `now`.
pub fn compute_stats<Tz: TimeZone>(tasks: &[Task], now: &DateTime<Tz>) -> UserStats {
    let tz = now.timezone();
    let completed: Vec<&Task> = tasks.iter().filter(|t| t.completed).collect();

    let mut stamps: Vec<DateTime<Utc>> = completed.iter().filter_map(|t| t.completed_at).collect();
    stamps.sort_unstable_by(|a, b| b.cmp(a));

    let (current_streak, longest_streak) = streaks(
        now.date_naive(),
        stamps.iter().map(|at| at.with_timezone(&tz).date_naive()),
    );

    UserStats {
        total_tasks_completed: completed.len(),
        current_streak,
        longest_streak,
        last_completion_date: stamps.first().copied(),
        total_pomodoro_sessions: 0,
    }
}
