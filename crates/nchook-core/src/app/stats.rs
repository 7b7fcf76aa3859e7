use serde::{Deserialize, Serialize};

/// Counters accumulated by the event loop over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    pub cycles: u64,
    pub records_seen: u64,
    pub delivered: u64,
    pub rehearsed: u64,
    pub ignored: u64,
    pub skipped: u64,
    pub delivery_failures: u64,
    pub transient_errors: u64,
    pub checkpoints: u64,
    pub checkpoint_failures: u64,
}
