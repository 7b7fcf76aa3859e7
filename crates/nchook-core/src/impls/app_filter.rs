//! AppFilter - bundle identifier の allowlist + plist デコード
//!
//! レコードの `data` は binary plist。中身の配置に注意:
//! - `titl` / `subt` / `body` は `req` 辞書の下
//! - `app` / `date` はトップレベル
//!
//! アプリ名は plist の `app` より JOIN で得た `app_identifier` を優先する。

use std::collections::HashSet;
use std::io::Cursor as IoCursor;
use std::time::{SystemTime, UNIX_EPOCH};

use plist::{Dictionary, Value};

use crate::domain::notification::COCOA_TO_UNIX_OFFSET;
use crate::domain::{Classification, HookError, Notification, Record};
use crate::ports::DispatchFilter;

/// Microsoft Teams (new and classic).
pub const DEFAULT_APPS: [&str; 2] = ["com.microsoft.teams2", "com.microsoft.teams"];

pub struct AppFilter {
    apps: HashSet<String>,
}

impl AppFilter {
    /// An empty allowlist accepts every app.
    pub fn new<I, S>(apps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            apps: apps.into_iter().map(Into::into).collect(),
        }
    }

    pub fn accept_all() -> Self {
        Self {
            apps: HashSet::new(),
        }
    }

    fn allows(&self, app: &str) -> bool {
        self.apps.is_empty() || self.apps.contains(app)
    }
}

impl Default for AppFilter {
    fn default() -> Self {
        Self::new(DEFAULT_APPS)
    }
}

fn text(dict: Option<&Dictionary>, key: &str) -> String {
    dict.and_then(|d| d.get(key))
        .and_then(Value::as_string)
        .unwrap_or_default()
        .to_string()
}

/// Seconds since the Cocoa epoch, whatever shape the plist stored it in.
fn cocoa_seconds(value: &Value) -> Option<f64> {
    match value {
        Value::Real(secs) => Some(*secs),
        Value::Integer(i) => i.as_signed().map(|secs| secs as f64),
        Value::Date(date) => SystemTime::from(*date)
            .duration_since(UNIX_EPOCH)
            .ok()
            .map(|d| d.as_secs_f64() - COCOA_TO_UNIX_OFFSET),
        _ => None,
    }
}

/// Decode the plist blob of a record into a payload.
pub fn decode_notification(record: &Record) -> Result<Notification, HookError> {
    let malformed = |reason: String| HookError::MalformedRecord {
        id: record.id,
        reason,
    };

    // from_reader は binary / XML を自動判別する
    let value = Value::from_reader(IoCursor::new(&record.data))
        .map_err(|e| malformed(format!("plist decode: {e}")))?;
    let root = value
        .as_dictionary()
        .ok_or_else(|| malformed("plist root is not a dictionary".into()))?;
    let req = root.get("req").and_then(Value::as_dictionary);

    let app = if record.app_identifier.is_empty() {
        text(Some(root), "app")
    } else {
        record.app_identifier.clone()
    };
    let date = root
        .get("date")
        .and_then(cocoa_seconds)
        .or(record.delivered_date);

    Ok(Notification {
        rec_id: record.id,
        app,
        title: text(req, "titl"),
        subtitle: text(req, "subt"),
        body: text(req, "body"),
        timestamp: 0.0,
        delivered_at: None,
    }
    .with_cocoa_date(date))
}

impl DispatchFilter for AppFilter {
    fn classify(&self, record: &Record) -> Result<Classification, HookError> {
        if !self.allows(&record.app_identifier) {
            return Ok(Classification::Ignored);
        }
        decode_notification(record).map(Classification::Qualified)
    }
}
