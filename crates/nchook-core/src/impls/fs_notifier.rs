//! FsChangeNotifier - DB ファイルの変更を OS の通知で待つ
//!
//! notify crate の watcher（Linux: inotify, macOS: FSEvents/kqueue）で
//! DB のディレクトリを監視し、`db` / `db-wal` / `db-shm` に触れるイベントが
//! 来たら ChangeLatch を立てます。WAL は作り直されることがあるので
//! ファイルではなくディレクトリを監視します。

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

use super::change_latch::ChangeLatch;
use crate::domain::HookError;
use crate::ports::{ChangeNotifier, Wake};

pub struct FsChangeNotifier {
    latch: ChangeLatch,
    watcher: Mutex<Option<RecommendedWatcher>>,
    dir: PathBuf,
}

/// File names whose mutation means the store may have new records.
fn watched_names(db_path: &Path) -> Vec<OsString> {
    let Some(name) = db_path.file_name() else {
        return Vec::new();
    };
    ["", "-wal", "-shm"]
        .iter()
        .map(|suffix| {
            let mut n = name.to_os_string();
            n.push(suffix);
            n
        })
        .collect()
}

fn is_relevant(event: &Event, names: &[OsString]) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event
        .paths
        .iter()
        .filter_map(|p| p.file_name())
        .any(|name| names.iter().any(|n| n == name))
}

impl FsChangeNotifier {
    pub fn watch(db_path: impl AsRef<Path>) -> Result<Self, HookError> {
        let db_path = db_path.as_ref();
        let dir = match db_path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let names = watched_names(db_path);
        let latch = ChangeLatch::new();

        let handle = latch.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            match res {
                Ok(event) if is_relevant(&event, &names) => handle.notify_change(),
                Ok(_) => {}
                Err(e) => {
                    // 取りこぼしより余分な fetch の方が安全
                    warn!(error = %e, "file watcher error");
                    handle.notify_change();
                }
            }
        })
        .map_err(|e| HookError::Notifier(format!("cannot create watcher: {e}")))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| HookError::Notifier(format!("cannot watch {}: {e}", dir.display())))?;
        debug!(dir = %dir.display(), "watching notification database directory");

        Ok(Self {
            latch,
            watcher: Mutex::new(Some(watcher)),
            dir,
        })
    }

    fn watcher(&self) -> MutexGuard<'_, Option<RecommendedWatcher>> {
        self.watcher.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ChangeNotifier for FsChangeNotifier {
    async fn wait(&self, timeout: Duration) -> Result<Wake, HookError> {
        self.latch.wait(timeout).await
    }

    async fn close(&self) {
        if let Some(mut watcher) = self.watcher().take()
            && let Err(e) = watcher.unwatch(&self.dir)
        {
            debug!(dir = %self.dir.display(), error = %e, "unwatch failed");
        }
        self.latch.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, ModifyKind};
    use std::fs;
    use tempfile::TempDir;

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn wal_and_db_modifications_are_relevant() {
        let names = watched_names(Path::new("/tmp/db2/db"));
        let modify = || EventKind::Modify(ModifyKind::Any);
        assert!(is_relevant(&event(modify(), "/tmp/db2/db"), &names));
        assert!(is_relevant(&event(modify(), "/tmp/db2/db-wal"), &names));
        assert!(is_relevant(&event(modify(), "/tmp/db2/db-shm"), &names));
        assert!(!is_relevant(&event(modify(), "/tmp/db2/other"), &names));
        assert!(!is_relevant(
            &event(EventKind::Access(AccessKind::Any), "/tmp/db2/db-wal"),
            &names
        ));
    }

    #[tokio::test]
    async fn writing_the_wal_wakes_the_waiter() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("db");
        fs::write(&db, b"").unwrap();
        let notifier = std::sync::Arc::new(FsChangeNotifier::watch(&db).unwrap());

        let waiter = tokio::spawn({
            let notifier = notifier.clone();
            async move { notifier.wait(Duration::from_secs(10)).await.unwrap() }
        });
        tokio::time::sleep(Duration::from_millis(200)).await;
        fs::write(dir.path().join("db-wal"), b"frame").unwrap();

        assert_eq!(waiter.await.unwrap(), Wake::Changed);
        notifier.close().await;
    }

    #[tokio::test]
    async fn closed_notifier_only_times_out() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("db");
        fs::write(&db, b"").unwrap();
        let notifier = FsChangeNotifier::watch(&db).unwrap();
        notifier.close().await;

        fs::write(&db, b"changed").unwrap();
        assert_eq!(
            notifier.wait(Duration::from_millis(100)).await.unwrap(),
            Wake::TimedOut
        );
    }
}
