//! Lifecycle - 終了シグナルと RunState
//!
//! # シグナル処理の契約
//! - ハンドラがやることは RunState を false にしてログを 1 行出すことだけ
//! - 永続化やリソース解放はしない（それは EventLoop の DRAINING / teardown）
//! - 何度届いても遷移は 1 回。ログも最初の 1 回だけ
//!
//! tokio::signal は OS のシグナルハンドラ内では pipe に書くだけで、
//! ここでの処理は通常の task として動きます。
//! `install_handlers` が終わるまではプラットフォーム既定の動作（即終了）が残ります。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tracing::info;

use crate::domain::HookError;

/// Process-wide "keep running" flag. One-way: true -> false.
#[derive(Debug, Clone)]
pub struct RunState {
    running: Arc<AtomicBool>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Flip the flag. Returns true only for the call that actually stopped
    /// the process; later calls are no-ops and do not log.
    pub fn request_stop(&self, reason: &str) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            info!(signal = reason, "received {reason}, shutting down after the current cycle");
        }
        was_running
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Keeps the signal listener alive. Dropping it stops listening.
pub struct SignalGuard {
    task: JoinHandle<()>,
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.task.abort();
    }
}

pub struct Lifecycle {
    run_state: RunState,
    installed: AtomicBool,
}

impl Lifecycle {
    pub fn new(run_state: RunState) -> Self {
        Self {
            run_state,
            installed: AtomicBool::new(false),
        }
    }

    pub fn run_state(&self) -> RunState {
        self.run_state.clone()
    }

    /// Register SIGTERM and SIGINT. Must run inside a tokio runtime, once,
    /// before the event loop starts.
    pub fn install_handlers(&self) -> Result<SignalGuard, HookError> {
        if self.installed.load(Ordering::Acquire) {
            return Err(HookError::HandlersInstalled);
        }
        let task = spawn_listener(self.run_state.clone())?;
        self.installed.store(true, Ordering::Release);
        Ok(SignalGuard { task })
    }
}

#[cfg(unix)]
fn spawn_listener(run_state: RunState) -> Result<JoinHandle<()>, HookError> {
    use tokio::signal::unix::{SignalKind, signal};

    // 登録はここで同期的に済ませる（spawn 後ではなく）
    let mut sigterm = signal(SignalKind::terminate()).map_err(HookError::Signal)?;
    let mut sigint = signal(SignalKind::interrupt()).map_err(HookError::Signal)?;

    Ok(tokio::spawn(async move {
        loop {
            let name = tokio::select! {
                Some(()) = sigterm.recv() => "SIGTERM",
                Some(()) = sigint.recv() => "SIGINT",
                else => break,
            };
            run_state.request_stop(name);
        }
    }))
}

#[cfg(not(unix))]
fn spawn_listener(run_state: RunState) -> Result<JoinHandle<()>, HookError> {
    Ok(tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            run_state.request_stop("Ctrl-C");
        }
    }))
}
