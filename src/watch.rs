use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};

/// Notices when another process saves a new snapshot to the database.
///
/// The parent directory is watched because SQLite writes through a `-wal`
/// file next to the database. Only writes to the database or its journal
/// count; `-shm` traffic, opens, closes and attribute changes do not.
pub struct SnapshotWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
}

impl SnapshotWatcher {
    pub fn new(db_path: &str) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let db_filename = Path::new(db_path)
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
                let Ok(event) = res else {
                    return;
                };
                if !is_write(&event.kind) {
                    return;
                }
                let ours = event.paths.iter().any(|p| {
                    p.file_name()
                        .is_some_and(|f| is_snapshot_file(&f.to_string_lossy(), &db_filename))
                });
                if ours {
                    let _ = tx.send(());
                }
            })
            .context("failed to create file watcher")?;

        let path = Path::new(db_path);
        let watch_path = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        watcher
            .watch(watch_path, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", watch_path.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// Block for up to `timeout`. Returns true if the database changed, in
    /// which case any burst of follow-up events is swallowed too.
    pub fn wait(&self, timeout: Duration) -> bool {
        let changed = wait_for_change(&self.rx, timeout);
        if changed {
            drain_events(&self.rx);
        }
        changed
    }
}

/// Opening a connection emits access, close-after-write and metadata
/// events on the `-wal` file without changing any data.
fn is_write(kind: &EventKind) -> bool {
    !matches!(
        kind,
        EventKind::Access(_) | EventKind::Modify(ModifyKind::Metadata(_))
    )
}

fn is_snapshot_file(name: &str, db_filename: &str) -> bool {
    match name.strip_prefix(db_filename) {
        Some(suffix) => matches!(suffix, "" | "-wal" | "-journal"),
        None => false,
    }
}

fn wait_for_change(rx: &Receiver<()>, timeout: Duration) -> bool {
    rx.recv_timeout(timeout).is_ok()
}

fn drain_events(rx: &Receiver<()>) {
    while rx.try_recv().is_ok() {}
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::db::SqliteStore;
    use crate::model::{Period, Task};
    use crate::store::{Command, Store};
    use chrono::Utc;
    use notify::event::{AccessKind, AccessMode, DataChange, MetadataKind};

    #[test]
    fn connection_noise_is_not_a_write() {
        assert!(!is_write(&EventKind::Access(AccessKind::Close(
            AccessMode::Write
        ))));
        assert!(!is_write(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::Any
        ))));
        assert!(is_write(&EventKind::Modify(ModifyKind::Data(
            DataChange::Any
        ))));
    }

    #[test]
    fn only_database_and_journal_files_count() {
        assert!(is_snapshot_file("zenith.db", "zenith.db"));
        assert!(is_snapshot_file("zenith.db-wal", "zenith.db"));
        assert!(is_snapshot_file("zenith.db-journal", "zenith.db"));
        assert!(!is_snapshot_file("zenith.db-shm", "zenith.db"));
        assert!(!is_snapshot_file("zenith.dbx", "zenith.db"));
        assert!(!is_snapshot_file("other.db", "zenith.db"));
    }

    #[test]
    fn reload_does_not_wake_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("zenith.db");
        let db_path = db_path.to_str().unwrap();

        let mut writer = Store::open(SqliteStore::open(db_path).unwrap());
        writer.dispatch(Command::AddTask(Task::new(
            "a",
            "First",
            Period::Daily,
            Utc::now(),
        )));
        let mut follower = Store::open(SqliteStore::open(db_path).unwrap());

        let watcher = SnapshotWatcher::new(db_path).unwrap();
        for _ in 0..3 {
            follower.reload();
            assert!(!watcher.wait(Duration::from_millis(300)));
        }
        assert_eq!(follower.state().tasks.len(), 1);
    }

    #[test]
    fn external_save_wakes_watcher() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("zenith.db");
        let db_path = db_path.to_str().unwrap();

        let mut writer = Store::open(SqliteStore::open(db_path).unwrap());
        let mut follower = Store::open(SqliteStore::open(db_path).unwrap());
        let watcher = SnapshotWatcher::new(db_path).unwrap();

        writer.dispatch(Command::AddTask(Task::new(
            "a",
            "First",
            Period::Daily,
            Utc::now(),
        )));
        assert!(watcher.wait(Duration::from_secs(2)));
        while watcher.wait(Duration::from_millis(200)) {}

        follower.reload();
        assert_eq!(follower.state().tasks.len(), 1);
        assert!(!watcher.wait(Duration::from_millis(300)));
    }

    #[test]
    fn timeout_without_events() {
        let (_tx, rx) = mpsc::channel::<()>();
        assert!(!wait_for_change(&rx, Duration::from_millis(10)));
    }

    #[test]
    fn drain_empties_queue() {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        tx.send(()).unwrap();
        drain_events(&rx);
        assert!(!wait_for_change(&rx, Duration::from_millis(10)));
    }
}
