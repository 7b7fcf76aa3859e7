//! SqliteRecordSource - Notification Center DB の読み取り専用アダプタ
//!
//! # 学習ポイント
//! - rusqlite の Connection は Sync ではないので Mutex で包む
//! - クエリは spawn_blocking で実行（async context をブロックしない）
//! - close 後は Option を None にして以降の呼び出しを SourceClosed にする

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::domain::{Cursor, HookError, Record, RecordId};
use crate::ports::RecordSource;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const FETCH_SINCE_SQL: &str = "\
    SELECT r.rec_id, r.data, a.identifier, r.delivered_date \
    FROM record r \
    JOIN app a ON r.app_id = a.app_id \
    WHERE r.rec_id > ?1 \
    ORDER BY r.rec_id ASC";

pub struct SqliteRecordSource {
    path: PathBuf,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteRecordSource {
    /// Open the database read-only and verify the expected schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HookError> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| HookError::Source(format!("cannot open {}: {e}", path.display())))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;

        verify_schema(&conn)?;

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM record", [], |row| row.get(0))?;
        info!(path = %path.display(), count, "notification database opened");

        Ok(Self {
            path: path.to_path_buf(),
            conn: Arc::new(Mutex::new(Some(conn))),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn verify_schema(conn: &Connection) -> Result<(), HookError> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table'")?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    if !tables.iter().any(|t| t == "record") || !tables.iter().any(|t| t == "app") {
        return Err(HookError::Schema(format!(
            "expected 'record' and 'app' tables, found {tables:?}"
        )));
    }
    Ok(())
}

fn lock(conn: &Mutex<Option<Connection>>) -> Result<MutexGuard<'_, Option<Connection>>, HookError> {
    conn.lock()
        .map_err(|_| HookError::Source("connection lock poisoned".into()))
}

fn query_since(conn: &Connection, after: i64) -> rusqlite::Result<Vec<Record>> {
    let mut stmt = conn.prepare_cached(FETCH_SINCE_SQL)?;
    let rows = stmt.query_map([after], |row| {
        Ok(Record {
            id: RecordId::new(row.get(0)?),
            data: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
            app_identifier: row.get(2)?,
            delivered_date: row.get(3)?,
        })
    })?;
    rows.collect()
}

#[async_trait]
impl RecordSource for SqliteRecordSource {
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Record>, HookError> {
        let conn = Arc::clone(&self.conn);
        let after = cursor.last_processed_id().get();

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            let conn = guard.as_ref().ok_or(HookError::SourceClosed)?;
            // 読み取り中のエラーはすべて一時的なものとして扱う（次のサイクルで再試行）
            query_since(conn, after).map_err(|e| HookError::SourceUnavailable(e.to_string()))
        })
        .await?
    }

    async fn max_id(&self) -> Result<RecordId, HookError> {
        let conn = Arc::clone(&self.conn);

        tokio::task::spawn_blocking(move || {
            let guard = lock(&conn)?;
            let conn = guard.as_ref().ok_or(HookError::SourceClosed)?;
            let max = conn
                .query_row("SELECT MAX(rec_id) FROM record", [], |row| {
                    row.get::<_, Option<i64>>(0)
                })
                .map_err(|e| HookError::SourceUnavailable(e.to_string()))?;
            Ok(RecordId::new(max.unwrap_or(0)))
        })
        .await?
    }

    async fn close(&self) {
        let taken = match lock(&self.conn) {
            Ok(mut guard) => guard.take(),
            Err(e) => {
                warn!(error = %e, "cannot close notification database");
                None
            }
        };
        if let Some(conn) = taken
            && let Err((_, e)) = conn.close()
        {
            warn!(path = %self.path.display(), error = %e, "error closing notification database");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seed_db(dir: &TempDir, rec_ids: &[i64]) -> PathBuf {
        let path = dir.path().join("db");
        let conn = Connection::open(&path).unwrap();
        conn.execute_batch(
            "CREATE TABLE app (app_id INTEGER PRIMARY KEY, identifier TEXT NOT NULL);
             CREATE TABLE record (
                 rec_id INTEGER PRIMARY KEY,
                 app_id INTEGER NOT NULL,
                 data BLOB,
                 delivered_date REAL
             );
             INSERT INTO app (app_id, identifier) VALUES (1, 'com.microsoft.teams2');",
        )
        .unwrap();
        for id in rec_ids {
            conn.execute(
                "INSERT INTO record (rec_id, app_id, data, delivered_date) VALUES (?1, 1, ?2, 700000000.5)",
                rusqlite::params![id, vec![0u8, 1, 2]],
            )
            .unwrap();
        }
        path
    }

    #[tokio::test]
    async fn fetch_since_returns_newer_records_in_order() {
        let dir = TempDir::new().unwrap();
        let path = seed_db(&dir, &[8, 6, 7, 5]);
        let source = SqliteRecordSource::open(&path).unwrap();

        let records = source.fetch_since(Cursor::from(5)).await.unwrap();
        let ids: Vec<i64> = records.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![6, 7, 8]);
        assert_eq!(records[0].app_identifier, "com.microsoft.teams2");
        assert_eq!(records[0].data, vec![0u8, 1, 2]);
        assert_eq!(records[0].delivered_date, Some(700000000.5));
    }

    #[tokio::test]
    async fn fetch_since_is_idempotent_and_empty_when_caught_up() {
        let dir = TempDir::new().unwrap();
        let source = SqliteRecordSource::open(seed_db(&dir, &[1, 2])).unwrap();

        let first = source.fetch_since(Cursor::from(0)).await.unwrap();
        let second = source.fetch_since(Cursor::from(0)).await.unwrap();
        assert_eq!(first, second);
        assert!(source.fetch_since(Cursor::from(2)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn max_id_handles_empty_table() {
        let dir = TempDir::new().unwrap();
        let source = SqliteRecordSource::open(seed_db(&dir, &[])).unwrap();
        assert_eq!(source.max_id().await.unwrap(), RecordId::ZERO);

        let dir = TempDir::new().unwrap();
        let source = SqliteRecordSource::open(seed_db(&dir, &[3, 9])).unwrap();
        assert_eq!(source.max_id().await.unwrap(), RecordId::new(9));
    }

    #[test]
    fn open_rejects_unexpected_schema() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("db");
        Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE record (rec_id INTEGER PRIMARY KEY);")
            .unwrap();

        let err = SqliteRecordSource::open(&path).err().unwrap();
        assert!(matches!(err, HookError::Schema(_)));
    }

    #[tokio::test]
    async fn fetch_after_close_is_fatal() {
        let dir = TempDir::new().unwrap();
        let source = SqliteRecordSource::open(seed_db(&dir, &[1])).unwrap();
        source.close().await;
        source.close().await;

        let err = source.fetch_since(Cursor::default()).await.unwrap_err();
        assert!(matches!(err, HookError::SourceClosed));
        assert!(!err.is_transient());
    }
}
