use std::io::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{AppState, Goal, Priority, Task};

pub const EXPORT_VERSION: &str = "1.0.0";

const CSV_HEADERS: [&str; 7] = [
    "Title",
    "Period",
    "Date",
    "Duration (min)",
    "Completed",
    "Priority",
    "Tags",
];

/// Full backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    #[serde(default)]
    pub goal: Option<Goal>,
    pub tasks: Vec<Task>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ExportDocument {
    pub fn new(state: &AppState, now: DateTime<Utc>) -> Self {
        Self {
            goal: state.goal.clone(),
            tasks: state.tasks.clone(),
            export_date: Some(now),
            version: Some(EXPORT_VERSION.to_string()),
        }
    }

    pub fn into_state(self) -> AppState {
        AppState {
            goal: self.goal,
            tasks: self.tasks,
        }
    }
}

pub fn export_json(state: &AppState, now: DateTime<Utc>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&ExportDocument::new(state, now))?)
}

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

/// One quoted row per task under a fixed header. Dates are rendered as
/// calendar days in `tz`.
pub fn export_csv<Tz: TimeZone>(tasks: &[Task], tz: &Tz) -> String {
    let mut lines = vec![CSV_HEADERS.join(",")];
    for task in tasks {
        let row = [
            task.title.clone(),
            task.period.to_string(),
            task.date
                .with_timezone(tz)
                .date_naive()
                .format("%Y-%m-%d")
                .to_string(),
            task.estimated_duration.to_string(),
            if task.completed { "Yes" } else { "No" }.to_string(),
            task.priority.unwrap_or(Priority::Medium).to_string(),
            task.tags().join("; "),
        ];
        lines.push(row.iter().map(|c| quote(c)).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

/// Parse a backup document. Only the presence of a `tasks` array is checked
/// up front; the caller decides what to do with the result.
pub fn import_json(content: &str) -> Result<ExportDocument> {
    parse_document(content).map_err(|e| anyhow::anyhow!("Failed to parse JSON file: {e}"))
}

fn parse_document(content: &str) -> Result<ExportDocument> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if !value.get("tasks").is_some_and(serde_json::Value::is_array) {
        bail!("Invalid data format: tasks array missing");
    }
    Ok(serde_json::from_value(value)?)
}

pub fn backup_file_name(day: NaiveDate) -> String {
    format!("zenith-focus-backup-{}.json", day.format("%Y-%m-%d"))
}

pub fn csv_file_name(day: NaiveDate) -> String {
    format!("zenith-focus-tasks-{}.csv", day.format("%Y-%m-%d"))
}

/// Write `content` to `path` via a sibling temp file, so a reader never
/// sees a half-written export.
pub fn write_file(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}

pub fn read_file(path: &Path) -> Result<ExportDocument> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    import_json(&content)
}
