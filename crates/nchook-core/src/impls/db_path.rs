//! Notification Center DB の場所を探す
//!
//! 1. Sequoia (macOS 15) 以降: `~/Library/Group Containers/group.com.apple.usernoted/db2/db`
//! 2. それ以前: `$(getconf DARWIN_USER_DIR)/com.apple.notificationcenter/db2/db`

use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::domain::HookError;

const SEQUOIA_RELATIVE: &str = "Library/Group Containers/group.com.apple.usernoted/db2/db";
const LEGACY_RELATIVE: &str = "com.apple.notificationcenter/db2/db";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbLocation {
    pub db: PathBuf,
    pub wal: PathBuf,
}

impl DbLocation {
    pub fn new(db: impl Into<PathBuf>) -> Self {
        let db = db.into();
        let mut wal = db.clone().into_os_string();
        wal.push("-wal");
        Self {
            db,
            wal: PathBuf::from(wal),
        }
    }
}

fn sequoia_path(home: &Path) -> PathBuf {
    home.join(SEQUOIA_RELATIVE)
}

fn legacy_path(darwin_user_dir: &str) -> PathBuf {
    Path::new(darwin_user_dir.trim()).join(LEGACY_RELATIVE)
}

fn darwin_user_dir() -> Option<String> {
    let output = Command::new("getconf").arg("DARWIN_USER_DIR").output().ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout).ok()
}

/// Probe the known locations in order and return the first that exists.
pub fn detect_db_path() -> Result<DbLocation, HookError> {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| HookError::Config("HOME is not set".into()))?;

    let sequoia = sequoia_path(&home);
    if sequoia.exists() {
        return Ok(DbLocation::new(sequoia));
    }
    debug!(path = %sequoia.display(), "no Sequoia notification database");

    if let Some(dir) = darwin_user_dir() {
        let legacy = legacy_path(&dir);
        if legacy.exists() {
            return Ok(DbLocation::new(legacy));
        }
        debug!(path = %legacy.display(), "no legacy notification database");
    }

    Err(HookError::Config(format!(
        "notification database not found (checked {}); macOS Sequoia or later with an active \
         notification center database is required",
        sequoia.display()
    )))
}
