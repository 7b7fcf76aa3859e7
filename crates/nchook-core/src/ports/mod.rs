//! Ports - 抽象化レイヤー
//!
//! Hexagonal Architecture の「ポート」。EventLoop はこの trait だけに依存し、
//! SQLite / ファイル監視 / webhook といった外部の詳細は impls 側に閉じ込めます。
//!
//! # 設計原則
//! - 通知 DB が source of truth（このプロセスは読むだけ）
//! - cursor ファイルだけがこのプロセスの永続状態
//! - ブロックしてよいのは ChangeNotifier::wait だけ

pub mod change_notifier;
pub mod cursor_store;
pub mod delivery_sink;
pub mod dispatch_filter;
pub mod record_source;
pub mod reporter;

pub use self::change_notifier::{ChangeNotifier, Wake};
pub use self::cursor_store::CursorStore;
pub use self::delivery_sink::{DeliveryOutcome, DeliverySink};
pub use self::dispatch_filter::DispatchFilter;
pub use self::record_source::RecordSource;
pub use self::reporter::{StartupReporter, StartupSummary};
