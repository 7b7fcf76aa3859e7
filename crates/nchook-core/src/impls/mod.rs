//! Impls - ports の実装
//!
//! # 本番用
//! - **JsonCursorStore**: cursor ファイル（tmp + fsync + rename）
//! - **SqliteRecordSource**: Notification Center DB（読み取り専用）
//! - **FsChangeNotifier**: DB ディレクトリのファイル監視
//! - **AppFilter**: bundle id allowlist + plist デコード
//! - **WebhookSink**: reqwest による POST（RetryPolicy 付き）
//! - **LogReporter**: 起動バナー
//!
//! # 開発・テスト用
//! - **InMemoryRecordSource**
//! - **ChangeLatch**（手動で変更を通知できる ChangeNotifier）

pub mod app_filter;
pub mod change_latch;
pub mod db_path;
pub mod fs_notifier;
pub mod inmem_source;
pub mod json_cursor_store;
pub mod log_reporter;
pub mod retry;
pub mod sqlite_source;
pub mod webhook_sink;

pub use self::app_filter::{AppFilter, DEFAULT_APPS};
pub use self::change_latch::ChangeLatch;
pub use self::db_path::{DbLocation, detect_db_path};
pub use self::fs_notifier::FsChangeNotifier;
pub use self::inmem_source::InMemoryRecordSource;
pub use self::json_cursor_store::JsonCursorStore;
pub use self::log_reporter::LogReporter;
pub use self::retry::RetryPolicy;
pub use self::sqlite_source::SqliteRecordSource;
pub use self::webhook_sink::WebhookSink;
