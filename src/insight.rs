use chrono::{DateTime, Utc};

use crate::model::{Priority, Task};

pub const FIRST_TASK_PROMPT: &str = "Start by creating your first task!";

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Status messages for the task list as of `now`: at most one completion
/// tier message, then urgent and overdue counts when non-zero.
pub fn generate_insights(tasks: &[Task], now: DateTime<Utc>) -> Vec<String> {
    if tasks.is_empty() {
        return vec![FIRST_TASK_PROMPT.to_string()];
    }

    let mut insights = Vec::new();
    let completed = tasks.iter().filter(|t| t.completed).count();
    let rate = completed as f64 / tasks.len() as f64 * 100.0;

    if completed == tasks.len() {
        insights.push("🎉 Perfect! All tasks completed!".to_string());
    } else if rate >= 80.0 {
        insights.push("🌟 Excellent progress! Keep it up!".to_string());
    } else if rate >= 50.0 {
        insights.push("👍 Good progress! You're halfway there!".to_string());
    } else if completed > 0 {
        insights.push("💪 Keep going! Every task completed counts!".to_string());
    }

    let urgent = tasks
        .iter()
        .filter(|t| !t.completed && t.priority == Some(Priority::Urgent))
        .count();
    if urgent > 0 {
        let verb = if urgent == 1 { "needs" } else { "need" };
        insights.push(format!(
            "⚡ {urgent} urgent task{} {verb} attention!",
            plural(urgent)
        ));
    }

    let overdue = tasks.iter().filter(|t| !t.completed && t.date < now).count();
    if overdue > 0 {
        insights.push(format!("⏰ {overdue} overdue task{}", plural(overdue)));
    }

    insights
}
