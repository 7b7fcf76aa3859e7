//! ChangeNotifier port - ストアの変更を待つ

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::HookError;

/// wait() が戻った理由
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Changed,
    TimedOut,
}

/// ChangeNotifier はストアの変更か timeout のどちらか早い方まで待つ
///
/// # 契約
/// - シグナルや spurious wakeup で待機が中断されてもエラーにしない。
///   残り時間を計算し直して待ち直すか、TimedOut として戻る
/// - 停止要求は RunState 経由でしか観測されない
/// - `close` 後は常に timeout まで待って TimedOut
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn wait(&self, timeout: Duration) -> Result<Wake, HookError>;

    async fn close(&self);
}
