use std::collections::HashSet;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;

use crate::model::{Goal, Task, UserStats};
use crate::progress::Progress;
use crate::store::ChildIndex;

#[derive(Serialize)]
pub struct TaskDetail<'a> {
    #[serde(flatten)]
    pub task: &'a Task,
    pub children: Vec<&'a str>,
}

fn day<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).date_naive().format("%Y-%m-%d").to_string()
}

fn stamp<Tz: TimeZone>(at: &DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz)
        .naive_local()
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn task_line<Tz: TimeZone>(task: &Task, tz: &Tz) -> String {
    let mut line = format!(
        "{} {}  [{} {}]",
        task.icon(),
        task.title,
        task.period,
        day(&task.date, tz)
    );
    if let Some(p) = task.priority {
        line.push_str(&format!(" !{}", p));
    }
    line.push_str(&format!(" ({})", task.id));
    line
}

pub fn format_task_detail<Tz: TimeZone>(task: &Task, children: &[&Task], tz: &Tz) -> String {
    let mut out = String::new();
    out.push_str(&format!("Id:          {}\n", task.id));
    out.push_str(&format!("Title:       {}\n", task.title));
    out.push_str(&format!("Period:      {}\n", task.period));
    out.push_str(&format!("Date:        {}\n", stamp(&task.date, tz)));
    if let Some(ref p) = task.parent_id {
        out.push_str(&format!("Parent:      {p}\n"));
    }
    let status = if task.completed { "completed" } else { "pending" };
    out.push_str(&format!("Status:      {status}\n"));
    if let Some(ref at) = task.completed_at {
        out.push_str(&format!("Completed:   {}\n", stamp(at, tz)));
    }
    out.push_str(&format!("Duration:    {} min\n", task.estimated_duration));
    if let Some(b) = task.break_duration {
        out.push_str(&format!("Break:       {b} min\n"));
    }
    if let Some(p) = task.priority {
        out.push_str(&format!("Priority:    {p}\n"));
    }
    if let Some(r) = task.reminder_minutes {
        out.push_str(&format!("Reminder:    {r} min before\n"));
    }
    if !task.tags().is_empty() {
        out.push_str(&format!("Tags:        {}\n", task.tags().join(", ")));
    }
    if let Some(ref d) = task.description {
        if !d.is_empty() {
            out.push_str(&format!("Description: {d}\n"));
        }
    }
    if !children.is_empty() {
        out.push('\n');
        out.push_str("Subtasks:\n");
        for child in children {
            out.push_str(&format!("  {}\n", task_line(child, tz)));
        }
    }
    out
}

pub fn format_task_list<Tz: TimeZone>(tasks: &[&Task], tz: &Tz) -> String {
    let mut out = String::new();
    for task in tasks {
        let parent_info = task
            .parent_id
            .as_ref()
            .map(|p| format!(" (parent: {p})"))
            .unwrap_or_default();
        out.push_str(&format!("{}{parent_info}\n", task_line(task, tz)));
    }
    out
}

/// Render tasks as a forest. Tasks whose parent is not in `tasks` are shown
/// as roots so that filtered views keep every match visible.
pub fn format_task_tree<Tz: TimeZone>(tasks: &[&Task], tz: &Tz) -> String {
    if tasks.is_empty() {
        return String::new();
    }

    let index = ChildIndex::build(tasks.iter().copied());
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();

    let mut out = String::new();
    let mut seen = HashSet::new();
    for &root in tasks
        .iter()
        .filter(|t| !matches!(t.parent_id.as_deref(), Some(p) if ids.contains(p)))
    {
        write_tree(&mut out, root, &index, tz, "", "", &mut seen);
    }
    out
}

/// Write a task line and recurse into children.
/// `line_prefix` is what goes before the status icon on this task's line.
/// `child_prefix` is the base prefix for this task's children's tree connectors.
fn write_tree<'a, Tz: TimeZone>(
    out: &mut String,
    task: &'a Task,
    index: &ChildIndex<'a>,
    tz: &Tz,
    line_prefix: &str,
    child_prefix: &str,
    seen: &mut HashSet<&'a str>,
) {
    if !seen.insert(task.id.as_str()) {
        return;
    }
    out.push_str(&format!("{line_prefix}{}\n", task_line(task, tz)));

    let children = index.children(&task.id);
    for (i, &child) in children.iter().enumerate() {
        let is_last = i == children.len() - 1;
        let (connector, extension) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        write_tree(
            out,
            child,
            index,
            tz,
            &format!("{child_prefix}{connector}"),
            &format!("{child_prefix}{extension}"),
            seen,
        );
    }
}

fn bar(percent: u32) -> String {
    let filled = (percent.min(100) / 5) as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(20 - filled))
}

pub fn format_progress(progress: &Progress) -> String {
    let mut out = String::new();
    for (label, value) in [
        ("Goal", progress.goal),
        ("Monthly", progress.monthly),
        ("Weekly", progress.weekly),
        ("Daily", progress.daily),
    ] {
        out.push_str(&format!("{label:<8} {} {value:>3}%\n", bar(value)));
    }
    out
}

pub fn format_stats<Tz: TimeZone>(stats: &UserStats, tz: &Tz) -> String {
    let mut out = String::new();
    out.push_str(&format!("Completed:       {}\n", stats.total_tasks_completed));
    out.push_str(&format!("Current streak:  {} days\n", stats.current_streak));
    out.push_str(&format!("Longest streak:  {} days\n", stats.longest_streak));
    if let Some(ref at) = stats.last_completion_date {
        out.push_str(&format!("Last completion: {}\n", stamp(at, tz)));
    }
    out
}

pub fn format_insights(insights: &[String]) -> String {
    insights.iter().map(|i| format!("{i}\n")).collect()
}

pub fn format_goal(goal: &Goal) -> String {
    format!("{}  (target: {})\n", goal.title, goal.end_date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Period, Priority};

    fn make_task(id: &str, parent: Option<&str>, completed: bool) -> Task {
        let mut t = Task::new(
            id,
            format!("Title {id}"),
            Period::Daily,
            "2025-03-12T09:00:00Z".parse().unwrap(),
        );
        t.parent_id = parent.map(|s| s.to_string());
        t.completed = completed;
        t
    }

    #[test]
    fn tree_single_root() {
        let t = make_task("root", None, false);
        let out = format_task_tree(&[&t], &Utc);
        assert_eq!(out, ". Title root  [daily 2025-03-12] (root)\n");
    }

    #[test]
    fn tree_with_children() {
        let tasks = [
            make_task("root", None, false),
            make_task("child1", Some("root"), true),
            make_task("child2", Some("root"), false),
            make_task("grandchild", Some("child1"), false),
        ];
        let refs: Vec<&Task> = tasks.iter().collect();
        let out = format_task_tree(&refs, &Utc);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with(". Title root"));
        assert!(lines[1].starts_with("├── x Title child1"));
        assert!(lines[2].starts_with("│   └── . Title grandchild"));
        assert!(lines[3].starts_with("└── . Title child2"));
    }

    #[test]
    fn tree_orphan_shown_as_root() {
        let child = make_task("child", Some("gone"), false);
        let out = format_task_tree(&[&child], &Utc);
        assert!(out.starts_with(". Title child"));
    }

    #[test]
    fn flat_list() {
        let mut a = make_task("a", None, true);
        a.priority = Some(Priority::Urgent);
        let b = make_task("b", Some("a"), false);
        let out = format_task_list(&[&a, &b], &Utc);
        assert!(out.contains("x Title a  [daily 2025-03-12] !urgent (a)"));
        assert!(out.contains(". Title b  [daily 2025-03-12] (b) (parent: a)"));
    }

    #[test]
    fn detail_lists_subtasks() {
        let parent = make_task("p", None, false);
        let child = make_task("c", Some("p"), false);
        let out = format_task_detail(&parent, &[&child], &Utc);
        assert!(out.contains("Status:      pending"));
        assert!(out.contains("Subtasks:\n  . Title c"));
    }

    #[test]
    fn progress_bars() {
        let out = format_progress(&Progress {
            daily: 50,
            weekly: 0,
            monthly: 100,
            goal: 33,
        });
        assert!(out.contains("Daily    [##########----------]  50%"));
        assert!(out.contains("Monthly  [####################] 100%"));
    }
}
