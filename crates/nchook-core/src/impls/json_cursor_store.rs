//! JsonCursorStore - cursor を JSON ファイルに原子的に保存
//!
//! # 書き込み手順
//! 1. 同じディレクトリに一時ファイルを作る（rename を同一ボリューム内に収めるため）
//! 2. `{"last_rec_id": N}` を書いて fsync
//! 3. rename で本来のパスに置き換える
//! 4. Unix ではディレクトリも fsync（rename 自体を永続化）
//!
//! 途中で落ちても残るのは一時ファイルだけで、本体は旧値か新値のどちらか。

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::domain::{Cursor, HookError, RecordId};
use crate::ports::CursorStore;

#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    #[serde(default, deserialize_with = "lenient_rec_id")]
    last_rec_id: i64,
}

/// `12`, `12.0` and `"12"` all mean rec_id 12.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawRecId {
    Int(i64),
    Float(f64),
    Text(String),
}

fn lenient_rec_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match RawRecId::deserialize(deserializer)? {
        RawRecId::Int(value) => Ok(value),
        RawRecId::Float(value)
            if value.is_finite()
                && value.fract() == 0.0
                && value >= i64::MIN as f64
                && value < i64::MAX as f64 =>
        {
            Ok(value as i64)
        }
        RawRecId::Float(value) => Err(D::Error::custom(format!("not a whole rec_id: {value}"))),
        RawRecId::Text(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| D::Error::custom(format!("not a rec_id: {text:?}"))),
    }
}

pub struct JsonCursorStore {
    path: PathBuf,
}

impl JsonCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> &Path {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        }
    }

    fn write_atomically(&self, cursor: Cursor) -> io::Result<()> {
        let dir = self.parent_dir();
        let body = serde_json::to_vec(&CursorFile {
            last_rec_id: cursor.last_processed_id().get(),
        })?;

        // drop 時に一時ファイルは消える（persist 前に失敗した場合）
        let mut tmp = tempfile::Builder::new()
            .prefix(".cursor-")
            .suffix(".tmp")
            .tempfile_in(dir)?;
        tmp.write_all(&body)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        sync_dir(dir);
        Ok(())
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Err(e) = fs::File::open(dir).and_then(|d| d.sync_all()) {
        debug!(path = %dir.display(), error = %e, "directory fsync failed");
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

impl CursorStore for JsonCursorStore {
    fn load(&self) -> Cursor {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no cursor file, starting from 0");
                return Cursor::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cursor file unreadable, starting from 0");
                return Cursor::default();
            }
        };

        match serde_json::from_str::<CursorFile>(&raw) {
            Ok(file) if file.last_rec_id >= 0 => Cursor::new(RecordId::new(file.last_rec_id)),
            Ok(file) => {
                warn!(path = %self.path.display(), value = file.last_rec_id, "negative cursor ignored");
                Cursor::default()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "corrupt cursor file, starting from 0");
                Cursor::default()
            }
        }
    }

    fn save(&self, cursor: Cursor) -> Result<(), HookError> {
        self.write_atomically(cursor)
            .map_err(|source| HookError::CursorPersist {
                path: self.path.clone(),
                source,
            })?;
        debug!(path = %self.path.display(), %cursor, "cursor saved");
        Ok(())
    }
}
