//! Notification - webhook に送る payload と分類結果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RecordId;

/// Seconds between the Unix epoch (1970) and the Cocoa epoch (2001).
pub const COCOA_TO_UNIX_OFFSET: f64 = 978_307_200.0;

/// Notification は DeliverySink に渡す payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub rec_id: RecordId,
    pub app: String,
    pub title: String,
    pub subtitle: String,
    pub body: String,
    /// Unix epoch seconds (0 when the record carries no date)
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Cocoa epoch の秒から timestamp / delivered_at を埋める
    pub fn with_cocoa_date(mut self, cocoa_seconds: Option<f64>) -> Self {
        match cocoa_seconds {
            Some(secs) => {
                let unix = secs + COCOA_TO_UNIX_OFFSET;
                self.timestamp = unix;
                self.delivered_at = DateTime::from_timestamp_millis((unix * 1000.0) as i64);
            }
            None => {
                self.timestamp = 0.0;
                self.delivered_at = None;
            }
        }
        self
    }
}

/// DispatchFilter の判定結果
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// 配送対象。payload を DeliverySink に渡す
    Qualified(Notification),
    /// 対象外（cursor は進める）
    Ignored,
}

impl Classification {
    pub fn qualifies(&self) -> bool {
        matches!(self, Classification::Qualified(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank(rec_id: i64) -> Notification {
        Notification {
            rec_id: RecordId::new(rec_id),
            app: "com.microsoft.teams2".into(),
            title: String::new(),
            subtitle: String::new(),
            body: String::new(),
            timestamp: 0.0,
            delivered_at: None,
        }
    }

    #[test]
    fn cocoa_date_is_shifted_to_unix_epoch() {
        let n = blank(1).with_cocoa_date(Some(0.0));
        assert_eq!(n.timestamp, COCOA_TO_UNIX_OFFSET);
        assert_eq!(
            n.delivered_at.unwrap().to_rfc3339(),
            "2001-01-01T00:00:00+00:00"
        );
    }

    #[test]
    fn missing_date_yields_zero_timestamp() {
        let n = blank(1).with_cocoa_date(None);
        assert_eq!(n.timestamp, 0.0);
        let json = serde_json::to_value(&n).unwrap();
        assert!(json.get("delivered_at").is_none());
        assert_eq!(json["rec_id"], 1);
    }
}
