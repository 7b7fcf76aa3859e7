//! ChangeLatch - Mutex + Condvar による「変更あり」フラグ
//!
//! # 学習ポイント
//! - Condvar::wait_timeout は spurious wakeup で早く戻ることがある
//! - 戻るたびに開始時刻から残り時間を計算し直して待ち直す
//! - 中断は「エラー」ではなく、ループ先頭での再判定に吸収する
//!
//! FsChangeNotifier の土台であり、単体でも ChangeNotifier として使える
//! （テストでは `notify_change` を手で呼ぶ）。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use crate::domain::HookError;
use crate::ports::{ChangeNotifier, Wake};

struct LatchInner {
    pending: Mutex<bool>,
    condvar: Condvar,
    closed: AtomicBool,
}

impl LatchInner {
    fn pending(&self) -> MutexGuard<'_, bool> {
        self.pending.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn wait_blocking(&self, timeout: Duration) -> Wake {
        let start = Instant::now();
        let mut pending = self.pending();
        loop {
            if *pending {
                *pending = false;
                return Wake::Changed;
            }
            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Wake::TimedOut;
            }
            let (guard, _) = self
                .condvar
                .wait_timeout(pending, timeout - elapsed)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            pending = guard;
        }
    }
}

/// Cheap to clone; every clone shares the same flag.
#[derive(Clone)]
pub struct ChangeLatch {
    inner: Arc<LatchInner>,
}

impl ChangeLatch {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(LatchInner {
                pending: Mutex::new(false),
                condvar: Condvar::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Mark the store as changed and wake the waiter. No-op once closed.
    pub fn notify_change(&self) {
        if self.inner.closed.load(Ordering::Acquire) {
            return;
        }
        *self.inner.pending() = true;
        self.inner.condvar.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub(crate) fn shut(&self) {
        self.inner.closed.store(true, Ordering::Release);
        *self.inner.pending() = false;
    }
}

impl Default for ChangeLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChangeNotifier for ChangeLatch {
    async fn wait(&self, timeout: Duration) -> Result<Wake, HookError> {
        let inner = Arc::clone(&self.inner);
        // Condvar の待機は blocking pool で行う
        let wake = tokio::task::spawn_blocking(move || inner.wait_blocking(timeout))
            .await
            .map_err(|e| HookError::Notifier(format!("wait task failed: {e}")))?;
        Ok(wake)
    }

    async fn close(&self) {
        self.shut();
    }
}
