use anyhow::{bail, Result};

use crate::model::{Period, Priority, Task};

/// Completion filter for task searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Completed,
    Pending,
}

impl StatusFilter {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "all" => Ok(Self::All),
            "completed" | "done" => Ok(Self::Completed),
            "pending" | "open" => Ok(Self::Pending),
            _ => bail!("invalid status '{s}': must be all, completed, or pending"),
        }
    }

    fn matches(self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Pending => !task.completed,
        }
    }
}

/// Search criteria; every criterion that is set must match.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    /// Case-insensitive substring of title, description, or any tag.
    pub query: Option<String>,
    pub priority: Option<Priority>,
    pub status: StatusFilter,
    pub period: Option<Period>,
}

impl TaskFilter {
    pub fn is_active(&self) -> bool {
        self.query.as_deref().is_some_and(|q| !q.is_empty())
            || self.priority.is_some()
            || self.status != StatusFilter::All
            || self.period.is_some()
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(query) = self.query.as_deref().filter(|q| !q.is_empty()) {
            let query = query.to_lowercase();
            let hit = task.title.to_lowercase().contains(&query)
                || task
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || task
                    .tags()
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&query));
            if !hit {
                return false;
            }
        }
        if self.priority.is_some() && task.priority != self.priority {
            return false;
        }
        if self.period.is_some_and(|p| p != task.period) {
            return false;
        }
        self.status.matches(task)
    }

    /// Matching tasks in input order.
    pub fn apply<'a>(&self, tasks: &'a [Task]) -> Vec<&'a Task> {
        tasks.iter().filter(|t| self.matches(t)).collect()
    }
}
