//! InMemoryRecordSource - 開発・テスト用のレコードログ
//!
//! SQLite を使わずに EventLoop を動かすための実装。
//! `fail_next_fetches` で一時エラーを注入できます。

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{Cursor, HookError, Record, RecordId};
use crate::ports::RecordSource;

#[derive(Default)]
struct SourceState {
    records: BTreeMap<RecordId, Record>,
    closed: bool,
    failures_pending: usize,
    fatal: Option<String>,
    fetch_calls: usize,
}

#[derive(Default)]
pub struct InMemoryRecordSource {
    state: Mutex<SourceState>,
}

impl InMemoryRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let source = Self::new();
        for record in records {
            source.append(record);
        }
        source
    }

    fn state(&self) -> MutexGuard<'_, SourceState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a record. The store assigns ids, so an existing id is replaced.
    pub fn append(&self, record: Record) {
        self.state().records.insert(record.id, record);
    }

    /// The next `n` fetches fail with a transient error.
    pub fn fail_next_fetches(&self, n: usize) {
        self.state().failures_pending = n;
    }

    /// Every later fetch fails with a non-transient error.
    pub fn break_permanently(&self, reason: impl Into<String>) {
        self.state().fatal = Some(reason.into());
    }

    pub fn fetch_calls(&self) -> usize {
        self.state().fetch_calls
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

#[async_trait]
impl RecordSource for InMemoryRecordSource {
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Record>, HookError> {
        let mut state = self.state();
        state.fetch_calls += 1;
        if state.closed {
            return Err(HookError::SourceClosed);
        }
        if let Some(reason) = &state.fatal {
            return Err(HookError::Source(reason.clone()));
        }
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(HookError::SourceUnavailable("injected failure".into()));
        }
        Ok(state
            .records
            .range(cursor.last_processed_id()..)
            .filter(|(id, _)| cursor.is_behind(**id))
            .map(|(_, record)| record.clone())
            .collect())
    }

    async fn max_id(&self) -> Result<RecordId, HookError> {
        let state = self.state();
        if state.closed {
            return Err(HookError::SourceClosed);
        }
        Ok(state.records.keys().next_back().copied().unwrap_or_default())
    }

    async fn close(&self) {
        self.state().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64) -> Record {
        Record::new(id, "com.example.app", Vec::new())
    }

    #[tokio::test]
    async fn returns_only_records_after_cursor() {
        let source = InMemoryRecordSource::with_records([record(3), record(1), record(2)]);
        let ids: Vec<_> = source
            .fetch_since(Cursor::from(1))
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id.get())
            .collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(source.max_id().await.unwrap(), RecordId::new(3));
    }

    #[tokio::test]
    async fn injected_failures_are_transient_and_run_out() {
        let source = InMemoryRecordSource::with_records([record(1)]);
        source.fail_next_fetches(1);

        let err = source.fetch_since(Cursor::default()).await.unwrap_err();
        assert!(err.is_transient());
        assert_eq!(source.fetch_since(Cursor::default()).await.unwrap().len(), 1);
        assert_eq!(source.fetch_calls(), 2);
    }
}
