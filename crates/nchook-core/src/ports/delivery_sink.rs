//! DeliverySink port - 外部への配送（webhook）
//!
//! 副作用のある経路（`send`）とログだけの経路（`rehearse`）を分けておき、
//! RunMode による振り分けは provided method の `deliver` が行います。

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::{HookError, Notification, RunMode};

/// deliver() の結果。EventLoop には Err を返さない
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Sent,
    Rehearsed,
    Failed(String),
}

#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Perform the side effect. Retries, if any, happen in here.
    async fn send(&self, payload: &Notification) -> Result<(), HookError>;

    /// Log the payload that would have been sent.
    fn rehearse(&self, payload: &Notification) {
        let body = serde_json::to_string(payload).unwrap_or_else(|e| format!("<unserializable: {e}>"));
        info!(rec_id = %payload.rec_id, "[DRY RUN] would deliver: {body}");
    }

    async fn deliver(&self, payload: &Notification, mode: RunMode) -> DeliveryOutcome {
        if mode.is_rehearsal() {
            self.rehearse(payload);
            return DeliveryOutcome::Rehearsed;
        }
        match self.send(payload).await {
            Ok(()) => DeliveryOutcome::Sent,
            Err(e) => {
                warn!(rec_id = %payload.rec_id, error = %e, "delivery failed");
                DeliveryOutcome::Failed(e.to_string())
            }
        }
    }
}
