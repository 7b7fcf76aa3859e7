//! EventLoop - 待機 → 取得 → 判定 → 配送 → checkpoint のループ
//!
//! # 状態遷移
//! ```text
//! Running --(RunState が false)--> Draining --(最終 checkpoint)--> Stopped
//! ```
//!
//! # 方針
//! - 1 サイクルは必ず最後まで実行してから RunState を見る（協調的キャンセル）
//! - 判定に失敗したレコード（poison record）は飛ばして cursor を進める
//! - 配送の失敗も「処理済み」扱い（at-least-once、無限リトライしない）
//! - teardown（notifier / source の close）はどの終わり方でも必ず実行

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use super::lifecycle::RunState;
use super::stats::LoopStats;
use crate::domain::{Classification, Cursor, HookError, Record, RunMode};
use crate::ports::{
    ChangeNotifier, CursorStore, DeliveryOutcome, DeliverySink, DispatchFilter, RecordSource, Wake,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Running,
    Draining,
    Stopped,
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    /// None when the notifier itself failed.
    pub wake: Option<Wake>,
    pub processed: usize,
    pub cursor: Cursor,
}

/// Returned once the loop reaches `Stopped`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopReport {
    pub cursor: Cursor,
    pub stats: LoopStats,
}

pub struct EventLoop {
    pub(super) source: Arc<dyn RecordSource>,
    pub(super) notifier: Arc<dyn ChangeNotifier>,
    pub(super) cursor_store: Arc<dyn CursorStore>,
    pub(super) filter: Arc<dyn DispatchFilter>,
    pub(super) sink: Arc<dyn DeliverySink>,
    pub(super) run_state: RunState,
    pub(super) mode: RunMode,
    pub(super) poll_interval: Duration,
    pub(super) cursor: Cursor,
    pub(super) phase: LoopPhase,
    pub(super) stats: LoopStats,
}

impl EventLoop {
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    /// Run until RunState flips, then drain and tear down.
    ///
    /// The loop body runs in its own task so that teardown also happens when
    /// it panics; a panic surfaces as `HookError::Join`.
    pub async fn run(self) -> Result<LoopReport, HookError> {
        let source = Arc::clone(&self.source);
        let notifier = Arc::clone(&self.notifier);

        info!(cursor = %self.cursor, mode = %self.mode, poll_interval = ?self.poll_interval, "event loop started");
        let outcome = match tokio::spawn(self.drive()).await {
            Ok(result) => result,
            Err(join) => Err(HookError::from(join)),
        };

        notifier.close().await;
        source.close().await;

        match &outcome {
            Ok(report) => info!(cursor = %report.cursor, "event loop stopped"),
            Err(e) => error!(error = %e, "event loop aborted"),
        }
        outcome
    }

    async fn drive(mut self) -> Result<LoopReport, HookError> {
        while self.phase == LoopPhase::Running {
            self.run_cycle().await?;
            if !self.run_state.is_running() {
                self.phase = LoopPhase::Draining;
            }
        }
        self.drain();
        Ok(LoopReport {
            cursor: self.cursor,
            stats: self.stats.clone(),
        })
    }

    /// One Running cycle: wait, fetch, dispatch, checkpoint.
    ///
    /// Only non-transient fetch errors escape; everything else is logged and
    /// absorbed here.
    pub async fn run_cycle(&mut self) -> Result<CycleSummary, HookError> {
        self.stats.cycles += 1;

        // なぜ戻ったかに関係なく fetch する
        let wake = match self.notifier.wait(self.poll_interval).await {
            Ok(wake) => Some(wake),
            Err(e) => {
                warn!(error = %e, "change notifier failed, polling the store anyway");
                self.stats.transient_errors += 1;
                None
            }
        };

        let records = match self.source.fetch_since(self.cursor).await {
            Ok(records) => records,
            Err(e) if e.is_transient() => {
                warn!(error = %e, cursor = %self.cursor, "fetch failed, treating cycle as empty");
                self.stats.transient_errors += 1;
                return Ok(self.summary(wake, 0));
            }
            Err(e) => return Err(e),
        };

        let mut highest = None;
        let mut processed = 0;
        for record in &records {
            if !self.cursor.is_behind(record.id) {
                debug!(rec_id = %record.id, cursor = %self.cursor, "record at or behind cursor ignored");
                continue;
            }
            self.process(record).await;
            processed += 1;
            highest = highest.max(Some(record.id));
        }

        if let Some(highest) = highest
            && self.cursor.advance_to(highest)
        {
            self.checkpoint();
        }

        Ok(self.summary(wake, processed))
    }

    fn summary(&self, wake: Option<Wake>, processed: usize) -> CycleSummary {
        CycleSummary {
            wake,
            processed,
            cursor: self.cursor,
        }
    }

    async fn process(&mut self, record: &Record) {
        self.stats.records_seen += 1;
        match self.filter.classify(record) {
            Ok(Classification::Qualified(payload)) => {
                match self.sink.deliver(&payload, self.mode).await {
                    DeliveryOutcome::Sent => self.stats.delivered += 1,
                    DeliveryOutcome::Rehearsed => self.stats.rehearsed += 1,
                    DeliveryOutcome::Failed(reason) => {
                        // 配送側でリトライ済み。ここでは数えるだけ
                        debug!(rec_id = %record.id, %reason, "delivery gave up");
                        self.stats.delivery_failures += 1;
                    }
                }
            }
            Ok(Classification::Ignored) => {
                debug!(rec_id = %record.id, app = %record.app_identifier, "record ignored by filter");
                self.stats.ignored += 1;
            }
            Err(e) => {
                warn!(rec_id = %record.id, error = %e, "skipping record");
                self.stats.skipped += 1;
            }
        }
    }

    fn checkpoint(&mut self) {
        match self.cursor_store.save(self.cursor) {
            Ok(()) => self.stats.checkpoints += 1,
            Err(e) => {
                error!(
                    error = %e,
                    cursor = %self.cursor,
                    "cursor checkpoint failed, durable cursor is behind memory"
                );
                self.stats.checkpoint_failures += 1;
            }
        }
    }

    fn drain(&mut self) {
        self.phase = LoopPhase::Draining;
        self.checkpoint();
        info!(cursor = %self.cursor, "final checkpoint written");
        self.phase = LoopPhase::Stopped;
    }
}
