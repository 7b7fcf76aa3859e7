//! Domain model（record, cursor, run mode, payload, errors）
//!
//! ports / impls / app はすべてこの型を通してやり取りします。

pub mod cursor;
pub mod errors;
pub mod ids;
pub mod mode;
pub mod notification;
pub mod record;

pub use self::cursor::Cursor;
pub use self::errors::{ErrorKind, HookError};
pub use self::ids::RecordId;
pub use self::mode::RunMode;
pub use self::notification::{Classification, Notification};
pub use self::record::Record;
