//! RunMode - 本番配送かリハーサル（dry run）か

use std::fmt;

/// 起動時に決まり、以降は変わらない
///
/// - `Live`: DeliverySink の副作用（webhook POST）を実行
/// - `Rehearsal`: payload をログに出すだけ。cursor は Live と同じく進む
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunMode {
    #[default]
    Live,
    Rehearsal,
}

impl RunMode {
    pub fn from_dry_run(dry_run: bool) -> Self {
        if dry_run {
            RunMode::Rehearsal
        } else {
            RunMode::Live
        }
    }

    pub fn is_rehearsal(self) -> bool {
        matches!(self, RunMode::Rehearsal)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Live => f.write_str("live"),
            RunMode::Rehearsal => f.write_str("dry-run"),
        }
    }
}
