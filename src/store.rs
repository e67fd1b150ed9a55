//! The hierarchy store: the canonical `{goal, tasks}` snapshot and the
//! commands that replace it.
//!
//! All transitions go through [`apply`], which never mutates its input and
//! never fails. A command naming an id that matches no task yields an
//! unchanged copy of the state.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Utc};

use crate::db::SnapshotStore;
use crate::model::{AppState, Goal, Task};
use crate::validate::detect_parent_cycle;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetGoal(Goal),
    AddTask(Task),
    UpdateTask(Task),
    UpdateTaskStatus { id: String, completed: bool },
    DeleteTask(String),
    ReplaceState(AppState),
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Self::SetGoal(_) => "set-goal",
            Self::AddTask(_) => "add-task",
            Self::UpdateTask(_) => "update-task",
            Self::UpdateTaskStatus { .. } => "update-task-status",
            Self::DeleteTask(_) => "delete-task",
            Self::ReplaceState(_) => "replace-state",
        }
    }
}

/// Apply `command` to `state`, stamping completions with the current instant.
pub fn apply(state: &AppState, command: Command) -> AppState {
    apply_at(state, command, Utc::now())
}

/// Apply `command` to `state`, stamping completions with `now`.
pub fn apply_at(state: &AppState, command: Command, now: DateTime<Utc>) -> AppState {
    match command {
        Command::SetGoal(goal) => AppState {
            goal: Some(goal),
            tasks: state.tasks.clone(),
        },
        Command::AddTask(task) => {
            let mut tasks = Vec::with_capacity(state.tasks.len() + 1);
            tasks.extend(state.tasks.iter().cloned());
            tasks.push(task);
            AppState {
                goal: state.goal.clone(),
                tasks,
            }
        }
        Command::UpdateTask(task) => {
            if let Some(parent) = task.parent_id.as_deref() {
                if detect_parent_cycle(&state.tasks, &task.id, parent) {
                    log::warn!(
                        "refusing update of '{}': parent '{parent}' would create a cycle",
                        task.id
                    );
                    return state.clone();
                }
            }
            AppState {
                goal: state.goal.clone(),
                tasks: state
                    .tasks
                    .iter()
                    .map(|t| if t.id == task.id { task.clone() } else { t.clone() })
                    .collect(),
            }
        }
        Command::UpdateTaskStatus { id, completed } => AppState {
            goal: state.goal.clone(),
            tasks: state
                .tasks
                .iter()
                .map(|t| {
                    if t.id == id {
                        Task {
                            completed,
                            completed_at: completed.then_some(now),
                            ..t.clone()
                        }
                    } else {
                        t.clone()
                    }
                })
                .collect(),
        },
        Command::DeleteTask(id) => {
            let doomed = collect_subtree(&state.tasks, &id);
            AppState {
                goal: state.goal.clone(),
                tasks: state
                    .tasks
                    .iter()
                    .filter(|t| !doomed.contains(t.id.as_str()))
                    .cloned()
                    .collect(),
            }
        }
        Command::ReplaceState(next) => next,
    }
}

/// `id` plus every task reachable from it through `parent_id` links.
fn collect_subtree<'a>(tasks: &'a [Task], id: &'a str) -> HashSet<&'a str> {
    let mut doomed: HashSet<&str> = descendants_of(tasks, id)
        .into_iter()
        .map(|t| t.id.as_str())
        .collect();
    doomed.insert(id);
    doomed
}

/// Direct children of `parent_id`, in insertion order.
pub fn children_of<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.parent_id.as_deref() == Some(parent_id))
        .collect()
}

/// Every descendant of `id` at any depth, breadth-first. Excludes `id` itself.
pub fn descendants_of<'a>(tasks: &'a [Task], id: &str) -> Vec<&'a Task> {
    let index = ChildIndex::build(tasks);
    let mut result = Vec::new();
    let mut seen: HashSet<&str> = HashSet::from([id]);
    let mut queue = VecDeque::from([id]);
    while let Some(current) = queue.pop_front() {
        for &child in index.children(current) {
            if seen.insert(child.id.as_str()) {
                result.push(child);
                queue.push_back(child.id.as_str());
            }
        }
    }
    result
}

/// Parent → children lookup built once over a snapshot.
pub struct ChildIndex<'a> {
    by_parent: HashMap<&'a str, Vec<&'a Task>>,
}

impl<'a> ChildIndex<'a> {
    pub fn build(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut by_parent: HashMap<&str, Vec<&Task>> = HashMap::new();
        for task in tasks {
            if let Some(parent) = task.parent_id.as_deref() {
                by_parent.entry(parent).or_default().push(task);
            }
        }
        Self { by_parent }
    }

    pub fn children(&self, parent_id: &str) -> &[&'a Task] {
        self.by_parent
            .get(parent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

/// Owns the current snapshot and forwards every replacement to the
/// persistence gateway.
pub struct Store<S: SnapshotStore> {
    state: AppState,
    gateway: S,
}

impl<S: SnapshotStore> Store<S> {
    /// Load the persisted snapshot, falling back to the empty state when it
    /// is missing or unreadable.
    pub fn open(gateway: S) -> Self {
        let state = match gateway.load() {
            Ok(Some(state)) => state,
            Ok(None) => AppState::default(),
            Err(e) => {
                log::warn!("could not load stored state, starting empty: {e:#}");
                AppState::default()
            }
        };
        Self { state, gateway }
    }

    /// Re-read the persisted snapshot through the existing connection. An
    /// unreadable or missing snapshot keeps the current state.
    pub fn reload(&mut self) {
        match self.gateway.load() {
            Ok(Some(state)) => self.state = state,
            Ok(None) => {}
            Err(e) => log::warn!("could not reload stored state: {e:#}"),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn gateway(&self) -> &S {
        &self.gateway
    }

    /// Apply `command`, then persist the new snapshot. Save failures are
    /// logged and otherwise ignored; the in-memory state is authoritative.
    pub fn dispatch(&mut self, command: Command) -> &AppState {
        self.dispatch_at(command, Utc::now())
    }

    pub fn dispatch_at(&mut self, command: Command, now: DateTime<Utc>) -> &AppState {
        let name = command.name();
        self.state = apply_at(&self.state, command, now);
        log::debug!("applied {name}; {} tasks", self.state.tasks.len());
        if let Err(e) = self.gateway.save(&self.state) {
            log::error!("could not save state after {name}: {e:#}");
        }
        &self.state
    }
}
