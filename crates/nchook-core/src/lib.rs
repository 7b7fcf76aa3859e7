//! nchook-core
//!
//! Notification Center DB を監視して、条件に合う通知を webhook に中継する
//! 常駐プロセスの中核部分。
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（RecordId, Record, Cursor, RunMode, Notification, HookError）
//! - **ports**: 抽象化レイヤー（CursorStore, RecordSource, ChangeNotifier, DispatchFilter, DeliverySink）
//! - **impls**: 実装（JSON cursor ファイル, SQLite, ファイル監視, plist フィルタ, webhook）
//! - **app**: EventLoop, Lifecycle（シグナル）, AppBuilder
//! - **config**: 設定ファイル

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;

pub use app::{AppBuilder, EventLoop, Lifecycle, LoopReport, RunState};
pub use config::HookConfig;
pub use domain::{Cursor, HookError, RunMode};
