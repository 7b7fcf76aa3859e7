//! 起動時の cursor 整合チェック（DB purge 検知）

use tracing::warn;

use crate::domain::Cursor;
use crate::ports::RecordSource;

/// Reset the cursor to 0 when the store was purged behind our back.
///
/// A persisted cursor above the store's highest id means the database was
/// wiped or replaced; keeping it would silently skip every new record.
/// If the store cannot report its max id the cursor is kept as is.
pub async fn reconcile_cursor(source: &dyn RecordSource, mut cursor: Cursor) -> Cursor {
    match source.max_id().await {
        Ok(max) if cursor.last_processed_id() > max => {
            warn!(
                persisted = %cursor,
                max_rec_id = %max,
                "database purge detected, resetting cursor to 0"
            );
            cursor.reset();
            cursor
        }
        Ok(_) => cursor,
        Err(e) => {
            warn!(error = %e, %cursor, "cannot read max rec_id, keeping persisted cursor");
            cursor
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Record;
    use crate::impls::InMemoryRecordSource;
    use rstest::rstest;

    #[rstest]
    #[case(&[1, 2, 3], 2, 2)]
    #[case(&[1, 2, 3], 3, 3)]
    #[case(&[1, 2, 3], 50, 0)]
    #[case(&[], 7, 0)]
    #[case(&[], 0, 0)]
    #[tokio::test]
    async fn purge_resets_cursor(#[case] ids: &[i64], #[case] persisted: i64, #[case] expected: i64) {
        let source =
            InMemoryRecordSource::with_records(ids.iter().map(|id| Record::new(*id, "app", Vec::new())));
        let cursor = reconcile_cursor(&source, Cursor::from(persisted)).await;
        assert_eq!(cursor, Cursor::from(expected));
    }

    #[tokio::test]
    async fn unreadable_store_keeps_cursor() {
        let source = InMemoryRecordSource::new();
        source.close().await;
        let cursor = reconcile_cursor(&source, Cursor::from(9)).await;
        assert_eq!(cursor, Cursor::from(9));
    }
}
