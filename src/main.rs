mod cli;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use clap::Parser;

use cli::{Cli, Command, ExportFormat, GoalAction};
use zenith::config::Config;
use zenith::db::SqliteStore;
use zenith::filter::{StatusFilter, TaskFilter};
use zenith::model::{AppState, Goal, Period, Priority, Task};
use zenith::progress::{compute_progress, Windows};
use zenith::store::{self, Command as StoreCommand, Store};
use zenith::{affirmation, export, insight, output, paths, reminder, streak, validate, watch};

fn resolve_db_path(cli_db: Option<String>) -> String {
    cli_db.unwrap_or_else(paths::db_path)
}

fn ensure_db_dir(db_path: &str) -> Result<()> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    Ok(())
}

fn open_store(db_path: &str) -> Result<Store<SqliteStore>> {
    Ok(Store::open(SqliteStore::open(db_path)?))
}

/// Logs go to stderr at `warn` unless `RUST_LOG` says otherwise, or to the
/// file named by `ZENITH_LOG`.
fn setup_logging() -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Ok(log_path) = std::env::var("ZENITH_LOG") {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {log_path}"))?;
        builder
            .target(env_logger::Target::Pipe(Box::new(file)))
            .format_timestamp_secs();
    }
    builder.init();
    Ok(())
}

/// `YYYY-MM-DD` means local midnight; anything else must be RFC 3339.
fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let local = day
            .and_time(NaiveTime::MIN)
            .and_local_timezone(Local)
            .earliest()
            .with_context(|| format!("'{s}' has no local midnight"))?;
        return Ok(local.with_timezone(&Utc));
    }
    let at = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("invalid date '{s}': expected YYYY-MM-DD or RFC 3339"))?;
    Ok(at.with_timezone(&Utc))
}

fn find_task<'a>(state: &'a AppState, id: &str) -> Result<&'a Task> {
    match state.tasks.iter().find(|t| t.id == id) {
        Some(task) => Ok(task),
        None => bail!("task '{id}' not found"),
    }
}

fn non_zero(n: u32) -> Option<u32> {
    (n > 0).then_some(n)
}

fn new_id(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    setup_logging()?;
    let db_path = resolve_db_path(cli.db);
    ensure_db_dir(&db_path)?;
    let mut store = open_store(&db_path)?;
    dispatch(&mut store, &db_path, cli.command)
}

fn dispatch(store: &mut Store<SqliteStore>, db_path: &str, command: Command) -> Result<()> {
    match command {
        Command::Goal { action } => match action {
            GoalAction::Set { title, end } => {
                validate::validate_goal(&title)?;
                let end_date = NaiveDate::parse_from_str(&end, "%Y-%m-%d")
                    .with_context(|| format!("invalid end date '{end}': expected YYYY-MM-DD"))?;
                store.dispatch(StoreCommand::SetGoal(Goal {
                    id: new_id("goal"),
                    title: title.clone(),
                    end_date,
                    created_at: Some(Utc::now()),
                }));
                eprintln!("Goal set: '{title}'");
            }
            GoalAction::Show { json } => match &store.state().goal {
                Some(goal) if json => println!("{}", serde_json::to_string_pretty(goal)?),
                Some(goal) => print!("{}", output::format_goal(goal)),
                None => eprintln!("No goal set"),
            },
        },

        Command::Add {
            title,
            period,
            parent,
            date,
            duration,
            break_minutes,
            reminder,
            priority,
            tags,
            desc,
            json,
        } => {
            validate::validate_title(&title)?;
            let defaults = Config::load()?.defaults;
            let period = Period::parse(&period)?;
            if let Some(p) = parent.as_deref() {
                find_task(store.state(), p)?;
            }
            let date = date.as_deref().map(parse_date).transpose()?.unwrap_or_else(Utc::now);
            let priority = match priority {
                Some(p) => Priority::parse(&p)?,
                None => defaults.priority,
            };

            let mut task = Task::new(new_id("task"), title, period, date);
            task.parent_id = parent;
            task.estimated_duration = duration.unwrap_or(defaults.estimated_duration);
            task.break_duration = non_zero(break_minutes.unwrap_or(defaults.break_duration));
            task.reminder_minutes = non_zero(reminder.unwrap_or(defaults.reminder_minutes));
            task.priority = Some(priority);
            task.tags = (!tags.is_empty()).then_some(tags);
            task.description = desc.filter(|d| !d.is_empty());

            let id = task.id.clone();
            if json {
                println!("{}", serde_json::to_string_pretty(&task)?);
            } else {
                println!("{id}");
            }
            store.dispatch(StoreCommand::AddTask(task));
            eprintln!("Added task '{id}'");
        }

        Command::Edit {
            id,
            title,
            date,
            duration,
            break_minutes,
            reminder,
            priority,
            tags,
            desc,
            parent,
            root,
        } => {
            let mut task = find_task(store.state(), &id)?.clone();
            if let Some(title) = title {
                validate::validate_title(&title)?;
                task.title = title;
            }
            if let Some(date) = date {
                task.date = parse_date(&date)?;
            }
            if let Some(d) = duration {
                task.estimated_duration = d;
            }
            if let Some(b) = break_minutes {
                task.break_duration = non_zero(b);
            }
            if let Some(r) = reminder {
                task.reminder_minutes = non_zero(r);
            }
            if let Some(p) = priority {
                task.priority = Some(Priority::parse(&p)?);
            }
            if !tags.is_empty() {
                task.tags = Some(tags);
            }
            if let Some(d) = desc {
                task.description = Some(d).filter(|d| !d.is_empty());
            }
            if let Some(p) = parent {
                find_task(store.state(), &p)?;
                if validate::detect_parent_cycle(&store.state().tasks, &id, &p) {
                    bail!("setting parent to '{p}' would create a cycle");
                }
                task.parent_id = Some(p);
            } else if root {
                task.parent_id = None;
            }
            store.dispatch(StoreCommand::UpdateTask(task));
            eprintln!("Updated task '{id}'");
        }

        Command::Done { id } => {
            find_task(store.state(), &id)?;
            store.dispatch(StoreCommand::UpdateTaskStatus {
                id: id.clone(),
                completed: true,
            });
            eprintln!("Marked '{id}' as completed");
        }

        Command::Undo { id } => {
            find_task(store.state(), &id)?;
            store.dispatch(StoreCommand::UpdateTaskStatus {
                id: id.clone(),
                completed: false,
            });
            eprintln!("Marked '{id}' as pending");
        }

        Command::Rm { id } => {
            find_task(store.state(), &id)?;
            let subtasks = store::descendants_of(&store.state().tasks, &id).len();
            store.dispatch(StoreCommand::DeleteTask(id.clone()));
            match subtasks {
                0 => eprintln!("Removed task '{id}'"),
                n => eprintln!("Removed task '{id}' and {n} subtask(s)"),
            }
        }

        Command::Show { id, json } => {
            let state = store.state();
            let task = find_task(state, &id)?;
            let children = store::children_of(&state.tasks, &id);
            if json {
                let detail = output::TaskDetail {
                    task,
                    children: children.iter().map(|c| c.id.as_str()).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&detail)?);
            } else {
                print!("{}", output::format_task_detail(task, &children, &Local));
            }
        }

        Command::List {
            tree,
            period,
            status,
            priority,
            query,
            current,
            json,
        } => {
            let filter = TaskFilter {
                query,
                priority: priority.as_deref().map(Priority::parse).transpose()?,
                status: status
                    .as_deref()
                    .map(StatusFilter::parse)
                    .transpose()?
                    .unwrap_or_default(),
                period: period.as_deref().map(Period::parse).transpose()?,
            };
            let mut tasks = filter.apply(&store.state().tasks);
            if current {
                let windows = Windows::at(&Local::now());
                tasks.retain(|t| windows.contains(t));
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() && (filter.is_active() || current) {
                eprintln!("No tasks match");
            } else if tree {
                print!("{}", output::format_task_tree(&tasks, &Local));
            } else {
                print!("{}", output::format_task_list(&tasks, &Local));
            }
        }

        Command::Progress { json } => {
            let progress = compute_progress(&store.state().tasks, &Local::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&progress)?);
            } else {
                print!("{}", output::format_progress(&progress));
            }
        }

        Command::Stats { json } => {
            let stats = streak::compute_stats(&store.state().tasks, &Local::now());
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                print!("{}", output::format_stats(&stats, &Local));
            }
        }

        Command::Insights => {
            let insights = insight::generate_insights(&store.state().tasks, Utc::now());
            print!("{}", output::format_insights(&insights));
        }

        Command::Dashboard => {
            let state = store.state();
            let now = Local::now();
            println!("{}", affirmation::random_affirmation(&mut rand::thread_rng()));
            println!();
            match &state.goal {
                Some(goal) => print!("{}", output::format_goal(goal)),
                None => println!("No goal set. Use `zenith goal set` to begin."),
            }
            println!();
            print!(
                "{}",
                output::format_stats(&streak::compute_stats(&state.tasks, &now), &Local)
            );
            println!();
            print!(
                "{}",
                output::format_progress(&compute_progress(&state.tasks, &now))
            );
            let insights = insight::generate_insights(&state.tasks, now.with_timezone(&Utc));
            if !insights.is_empty() {
                println!();
                print!("{}", output::format_insights(&insights));
            }
            match store.gateway().saved_at() {
                Ok(Some(saved_at)) => {
                    println!();
                    println!("Last saved: {saved_at}");
                }
                Ok(None) => {}
                Err(e) => log::warn!("could not read save time: {e:#}"),
            }
        }

        Command::Export { format, out } => {
            let now = Local::now();
            let state = store.state();
            let (content, default_name) = match format {
                ExportFormat::Json => (
                    export::export_json(state, now.with_timezone(&Utc))?,
                    export::backup_file_name(now.date_naive()),
                ),
                ExportFormat::Csv => (
                    export::export_csv(&state.tasks, &Local),
                    export::csv_file_name(now.date_naive()),
                ),
            };
            match out.as_deref() {
                Some("-") => println!("{content}"),
                Some(path) => {
                    export::write_file(Path::new(path), &content)?;
                    eprintln!("Exported to {path}");
                }
                None => {
                    let path = PathBuf::from(default_name);
                    export::write_file(&path, &content)?;
                    eprintln!("Exported to {}", path.display());
                }
            }
        }

        Command::Import { file } => {
            let doc = export::read_file(Path::new(&file))?;
            let count = doc.tasks.len();
            store.dispatch(StoreCommand::ReplaceState(doc.into_state()));
            eprintln!("Imported {count} task(s) from {file}");
        }

        Command::Remind { follow } => {
            if follow {
                follow_reminders(store, db_path)?;
            } else {
                for task in reminder::due_reminders(&store.state().tasks, Utc::now()) {
                    println!("{}", reminder::reminder_message(task));
                }
            }
        }
    }

    Ok(())
}

/// Scan once per `SCAN_INTERVAL` on a fixed schedule. Database changes
/// between scans reload the snapshot without moving the next scan.
fn follow_reminders(store: &mut Store<SqliteStore>, db_path: &str) -> Result<()> {
    let watcher = watch::SnapshotWatcher::new(db_path)?;
    let mut announced = reminder::ReminderLog::default();
    let mut next_scan = Instant::now();
    loop {
        let now = Instant::now();
        if now >= next_scan {
            for task in announced.take_due(&store.state().tasks, Utc::now()) {
                println!("{}", reminder::reminder_message(task));
            }
            next_scan += reminder::SCAN_INTERVAL;
            continue;
        }
        if watcher.wait(next_scan - now) {
            log::info!("database changed, reloading");
            store.reload();
        }
    }
}
