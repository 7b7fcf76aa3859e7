//! RecordSource port - append-only レコードログの読み取り専用ビュー

use async_trait::async_trait;

use crate::domain::{Cursor, HookError, Record, RecordId};

/// RecordSource は `id > cursor` のレコードを昇順で返す
///
/// # 契約
/// - 空の Vec は「まだ新しいデータが無い」。エラーではない
/// - 同じ cursor で何度呼んでもよい（冪等な読み取り）
/// - 一時的に読めない場合は `HookError::SourceUnavailable`
/// - `close` 後の呼び出しは `HookError::SourceClosed`
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_since(&self, cursor: Cursor) -> Result<Vec<Record>, HookError>;

    /// Highest id currently in the store (0 when empty).
    async fn max_id(&self) -> Result<RecordId, HookError>;

    async fn close(&self);
}
