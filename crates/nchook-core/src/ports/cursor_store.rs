//! CursorStore port - high-water mark の永続化

use crate::domain::{Cursor, HookError};

/// CursorStore は cursor を 1 つだけ永続化する
///
/// # 契約
/// - `load` は失敗しない。ファイルが無い・壊れている場合は 0 を返す（fail open）
/// - `save` は原子的。読み手は旧値か新値のどちらかしか観測しない
/// - 同期・ブロッキング。シグナル処理の文脈からは呼ばない
pub trait CursorStore: Send + Sync {
    fn load(&self) -> Cursor;

    fn save(&self, cursor: Cursor) -> Result<(), HookError>;
}
