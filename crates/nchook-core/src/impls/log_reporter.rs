//! LogReporter - 起動時のバナー

use tracing::info;

use crate::ports::{StartupReporter, StartupSummary};

const RULE: &str = "============================================================";

pub struct LogReporter {
    title: String,
}

impl LogReporter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for LogReporter {
    fn default() -> Self {
        Self::new("Teams Notification Interceptor")
    }
}

impl StartupReporter for LogReporter {
    fn report(&self, summary: &StartupSummary) {
        info!("{RULE}");
        info!("{}", self.title);
        info!("{RULE}");
        info!("  DB path:     {}", summary.db_path.display());
        info!("  WAL path:    {}", summary.wal_path.display());
        info!("  Mode:        {}", summary.mode);
        info!("  Last rec_id: {}", summary.cursor);
        info!("  Webhook:     {}", summary.webhook_url);
        info!("{RULE}");
    }
}
