//! AppBuilder - EventLoop の構築とワイヤリング
//!
//! # Fail-fast 設計
//! - 5 つの collaborator（source / notifier / cursor_store / filter / sink）は必須
//! - build() 時に不足をまとめて BuildError で返す
//! - 開始 cursor を指定しなければ CursorStore::load() の値を使う

use std::sync::Arc;
use std::time::Duration;

use super::event_loop::{EventLoop, LoopPhase};
use super::lifecycle::RunState;
use super::stats::LoopStats;
use crate::domain::{Cursor, RunMode};
use crate::ports::{ChangeNotifier, CursorStore, DeliverySink, DispatchFilter, RecordSource};

/// Ceiling on a single wait, and so on shutdown latency.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be provided before build().")]
    MissingComponents(Vec<&'static str>),

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,
}

/// # 使用例
/// ```ignore
/// let event_loop = AppBuilder::new()
///     .source(Arc::new(SqliteRecordSource::open(&db)?))
///     .notifier(Arc::new(FsChangeNotifier::watch(&db)?))
///     .cursor_store(Arc::new(JsonCursorStore::new("state.json")))
///     .filter(Arc::new(AppFilter::default()))
///     .sink(Arc::new(sink))
///     .run_state(lifecycle.run_state())
///     .build()?;
/// ```
#[derive(Default)]
pub struct AppBuilder {
    source: Option<Arc<dyn RecordSource>>,
    notifier: Option<Arc<dyn ChangeNotifier>>,
    cursor_store: Option<Arc<dyn CursorStore>>,
    filter: Option<Arc<dyn DispatchFilter>>,
    sink: Option<Arc<dyn DeliverySink>>,
    run_state: Option<RunState>,
    mode: RunMode,
    poll_interval: Option<Duration>,
    cursor: Option<Cursor>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: Arc<dyn RecordSource>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn cursor_store(mut self, cursor_store: Arc<dyn CursorStore>) -> Self {
        self.cursor_store = Some(cursor_store);
        self
    }

    pub fn filter(mut self, filter: Arc<dyn DispatchFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn DeliverySink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Share the flag the signal handlers write. A fresh one is used otherwise.
    pub fn run_state(mut self, run_state: RunState) -> Self {
        self.run_state = Some(run_state);
        self
    }

    pub fn mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = Some(poll_interval);
        self
    }

    /// Start from an already reconciled cursor instead of `CursorStore::load()`.
    pub fn starting_at(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    pub fn build(self) -> Result<EventLoop, BuildError> {
        let mut missing = Vec::new();
        if self.source.is_none() {
            missing.push("source");
        }
        if self.notifier.is_none() {
            missing.push("notifier");
        }
        if self.cursor_store.is_none() {
            missing.push("cursor_store");
        }
        if self.filter.is_none() {
            missing.push("filter");
        }
        if self.sink.is_none() {
            missing.push("sink");
        }

        let (Some(source), Some(notifier), Some(cursor_store), Some(filter), Some(sink)) =
            (self.source, self.notifier, self.cursor_store, self.filter, self.sink)
        else {
            return Err(BuildError::MissingComponents(missing));
        };

        let poll_interval = self.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL);
        if poll_interval.is_zero() {
            return Err(BuildError::ZeroPollInterval);
        }

        let cursor = self.cursor.unwrap_or_else(|| cursor_store.load());

        Ok(EventLoop {
            source,
            notifier,
            cursor_store,
            filter,
            sink,
            run_state: self.run_state.unwrap_or_default(),
            mode: self.mode,
            poll_interval,
            cursor,
            phase: LoopPhase::Running,
            stats: LoopStats::default(),
        })
    }
}
