//! Errors - エラー型と運用分類
//!
//! EventLoop は `ErrorKind` だけを見て「続行 / スキップ / 停止」を決めます。

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::ids::RecordId;

/// ErrorKind はエラーの運用分類
///
/// - Transient: 読み取り系の一時エラー。空サイクル扱いで続行
/// - PerRecord: 1 レコード単位の失敗。そのレコードを飛ばし cursor は進める
/// - Persistence: cursor の保存失敗。大きくログを出して続行
/// - Fatal: ループを抜ける（teardown は必ず走る）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transient,
    PerRecord,
    Persistence,
    Fatal,
}

#[derive(Debug, Error)]
pub enum HookError {
    #[error("record store unavailable: {0}")]
    SourceUnavailable(String),

    #[error("record store closed")]
    SourceClosed,

    #[error("record store failure: {0}")]
    Source(String),

    #[error("unexpected database schema: {0}")]
    Schema(String),

    #[error("change notifier failure: {0}")]
    Notifier(String),

    #[error("malformed record rec_id={id}: {reason}")]
    MalformedRecord { id: RecordId, reason: String },

    #[error("delivery failed for rec_id={id}: {reason}")]
    Delivery { id: RecordId, reason: String },

    #[error("failed to persist cursor to {path}: {source}")]
    CursorPersist {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to register signal handler: {0}")]
    Signal(#[source] io::Error),

    #[error("signal handlers already installed")]
    HandlersInstalled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("background task failed: {0}")]
    Join(String),
}

impl HookError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HookError::SourceUnavailable(_) | HookError::Notifier(_) => ErrorKind::Transient,
            HookError::MalformedRecord { .. } | HookError::Delivery { .. } => ErrorKind::PerRecord,
            HookError::CursorPersist { .. } => ErrorKind::Persistence,
            HookError::SourceClosed
            | HookError::Source(_)
            | HookError::Schema(_)
            | HookError::Signal(_)
            | HookError::HandlersInstalled
            | HookError::Config(_)
            | HookError::Join(_) => ErrorKind::Fatal,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

impl From<rusqlite::Error> for HookError {
    /// BUSY / LOCKED / I/O 系は一時エラー、それ以外は致命的
    fn from(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;
        match err.sqlite_error_code() {
            Some(
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::SystemIoFailure
                | ErrorCode::CannotOpen
                | ErrorCode::DatabaseCorrupt,
            ) => HookError::SourceUnavailable(err.to_string()),
            _ => HookError::Source(err.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for HookError {
    fn from(err: tokio::task::JoinError) -> Self {
        HookError::Join(err.to_string())
    }
}
