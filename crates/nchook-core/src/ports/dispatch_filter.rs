//! DispatchFilter port - レコードを配送するかどうかの判定

use crate::domain::{Classification, HookError, Record};

/// 純粋関数として扱う（副作用なし）
///
/// Err を返したレコードは poison record としてスキップされ、cursor は進む。
pub trait DispatchFilter: Send + Sync {
    fn classify(&self, record: &Record) -> Result<Classification, HookError>;
}
