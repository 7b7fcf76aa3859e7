//! Cursor - high-water mark
//!
//! # 不変条件
//! - 単調非減少（`advance_to` は小さい値を無視する）
//! - 0 は「まだ何も処理していない」
//! - 巻き戻しは `reset` だけ（DB purge のような外部要因でのみ呼ぶ）

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::RecordId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Cursor {
    last_processed_id: RecordId,
}

impl Cursor {
    pub const fn new(last_processed_id: RecordId) -> Self {
        Self { last_processed_id }
    }

    pub fn last_processed_id(&self) -> RecordId {
        self.last_processed_id
    }

    /// Move forward to `id`. Returns false (and leaves the cursor alone) when
    /// `id` is not ahead of the current position.
    pub fn advance_to(&mut self, id: RecordId) -> bool {
        if id > self.last_processed_id {
            self.last_processed_id = id;
            true
        } else {
            false
        }
    }

    /// Whether a record with `id` is still ahead of the cursor.
    pub fn is_behind(&self, id: RecordId) -> bool {
        id > self.last_processed_id
    }

    pub fn reset(&mut self) {
        self.last_processed_id = RecordId::ZERO;
    }
}

impl From<i64> for Cursor {
    fn from(value: i64) -> Self {
        Self::new(RecordId::new(value))
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.last_processed_id)
    }
}
