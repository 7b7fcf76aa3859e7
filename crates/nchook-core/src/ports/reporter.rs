//! StartupReporter port - 起動時サマリの表示

use std::path::PathBuf;

use crate::domain::{Cursor, RunMode};

/// 表示専用。EventLoop には何も返さない
#[derive(Debug, Clone)]
pub struct StartupSummary {
    pub db_path: PathBuf,
    pub wal_path: PathBuf,
    pub cursor: Cursor,
    pub mode: RunMode,
    pub webhook_url: String,
}

pub trait StartupReporter: Send + Sync {
    fn report(&self, summary: &StartupSummary);
}
