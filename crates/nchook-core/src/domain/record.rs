//! Record - ストアから読み出した 1 件

use super::ids::RecordId;

/// Record は append-only ストアの 1 エントリ
///
/// # 所有権
/// - フィールドはストアが所有（このプロセスは読むだけ）
/// - `id` 以外の中身は DispatchFilter だけが解釈する
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    /// `app` テーブルから JOIN した bundle identifier
    pub app_identifier: String,
    /// binary plist blob
    pub data: Vec<u8>,
    /// Cocoa epoch (2001-01-01) 基準の秒
    pub delivered_date: Option<f64>,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, app_identifier: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            app_identifier: app_identifier.into(),
            data,
            delivered_date: None,
        }
    }

    pub fn with_delivered_date(mut self, delivered_date: f64) -> Self {
        self.delivered_date = Some(delivered_date);
        self
    }
}
