use anyhow::{bail, Result};

use crate::model::Task;

/// Validate a task title: must contain something other than whitespace.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!("task title must not be empty");
    }
    Ok(())
}

/// Validate goal input before it reaches the store, which accepts any goal.
pub fn validate_goal(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        bail!("goal title must not be empty");
    }
    Ok(())
}

/// Detect if setting `task_id`'s parent to `new_parent` would create a cycle.
/// A cycle exists if `new_parent` is a descendant of `task_id` (or is `task_id` itself).
pub fn detect_parent_cycle(tasks: &[Task], task_id: &str, new_parent: &str) -> bool {
    if task_id == new_parent {
        return true;
    }
    // Walk up from new_parent to see if we reach task_id. The step bound
    // keeps a collection that already holds a cycle from looping forever.
    let mut current = new_parent;
    for _ in 0..tasks.len() {
        let parent = tasks
            .iter()
            .find(|t| t.id == current)
            .and_then(|t| t.parent_id.as_deref());
        match parent {
            Some(p) if p == task_id => return true,
            Some(p) => current = p,
            None => return false,
        }
    }
    false
}
