//! App - アプリケーション層
//!
//! ports を組み合わせて常駐処理を実装します。
//!
//! # 主要コンポーネント
//! - **AppBuilder**: EventLoop の構築とワイヤリング
//! - **EventLoop**: wait → fetch → classify → deliver → checkpoint
//! - **Lifecycle / RunState**: 終了シグナルと停止フラグ
//! - **reconcile_cursor**: 起動時の DB purge 検知

pub mod builder;
pub mod event_loop;
pub mod lifecycle;
pub mod startup;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use self::builder::{AppBuilder, BuildError, DEFAULT_POLL_INTERVAL};
pub use self::event_loop::{CycleSummary, EventLoop, LoopPhase, LoopReport};
pub use self::lifecycle::{Lifecycle, RunState, SignalGuard};
pub use self::startup::reconcile_cursor;
pub use self::stats::LoopStats;
