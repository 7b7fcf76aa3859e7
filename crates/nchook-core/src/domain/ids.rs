//! Record identifiers.
//!
//! ストア側（SQLite の `rec_id`）が採番する単調増加の整数を newtype で包みます。
//! `Cursor` と混同しないよう、比較・表示以外の演算は持たせていません。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned by the record store. Strictly increasing, unique.
#[repr(transparent)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// "まだ何も処理していない" を表す 0
    pub const ZERO: RecordId = RecordId(0);

    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
