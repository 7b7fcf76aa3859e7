//! Test doubles for the ports.

use std::collections::HashSet;
use std::io;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Classification, Cursor, HookError, Notification, Record, RecordId};
use crate::ports::{ChangeNotifier, CursorStore, DeliverySink, DispatchFilter, Wake};

pub fn record(id: i64) -> Record {
    Record::new(id, "com.microsoft.teams2", Vec::new())
}

fn notification(record: &Record) -> Notification {
    Notification {
        rec_id: record.id,
        app: record.app_identifier.clone(),
        title: format!("title {}", record.id),
        subtitle: String::new(),
        body: String::new(),
        timestamp: 0.0,
        delivered_at: None,
    }
}

#[derive(Default)]
struct StoreState {
    durable: Cursor,
    saves: Vec<Cursor>,
    failing: bool,
}

/// Records every save; can be told to fail.
#[derive(Default)]
pub struct MemoryCursorStore {
    state: Mutex<StoreState>,
}

impl MemoryCursorStore {
    pub fn starting_at(value: i64) -> Self {
        Self {
            state: Mutex::new(StoreState {
                durable: Cursor::from(value),
                ..Default::default()
            }),
        }
    }

    pub fn fail_saves(&self, failing: bool) {
        self.state.lock().unwrap().failing = failing;
    }

    /// Successful saves, in order.
    pub fn saves(&self) -> Vec<Cursor> {
        self.state.lock().unwrap().saves.clone()
    }

    pub fn durable(&self) -> Cursor {
        self.state.lock().unwrap().durable
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> Cursor {
        self.state.lock().unwrap().durable
    }

    fn save(&self, cursor: Cursor) -> Result<(), HookError> {
        let mut state = self.state.lock().unwrap();
        if state.failing {
            return Err(HookError::CursorPersist {
                path: "memory".into(),
                source: io::Error::other("disk full"),
            });
        }
        state.durable = cursor;
        state.saves.push(cursor);
        Ok(())
    }
}

#[derive(Default)]
struct FilterState {
    offered: Vec<i64>,
    poisoned: HashSet<i64>,
    ignored: HashSet<i64>,
}

/// Qualifies every record unless told otherwise; remembers what it saw.
#[derive(Default)]
pub struct SpyFilter {
    state: Mutex<FilterState>,
}

impl SpyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poison(&self, id: i64) {
        self.state.lock().unwrap().poisoned.insert(id);
    }

    pub fn ignore(&self, id: i64) {
        self.state.lock().unwrap().ignored.insert(id);
    }

    pub fn offered(&self) -> Vec<i64> {
        self.state.lock().unwrap().offered.clone()
    }
}

impl DispatchFilter for SpyFilter {
    fn classify(&self, record: &Record) -> Result<Classification, HookError> {
        let mut state = self.state.lock().unwrap();
        let id = record.id.get();
        state.offered.push(id);
        if state.poisoned.contains(&id) {
            return Err(HookError::MalformedRecord {
                id: record.id,
                reason: "poisoned".into(),
            });
        }
        if state.ignored.contains(&id) {
            return Ok(Classification::Ignored);
        }
        Ok(Classification::Qualified(notification(record)))
    }
}

#[derive(Default)]
struct SinkState {
    sent: Vec<i64>,
    rehearsed: Vec<i64>,
    failing: HashSet<i64>,
    panicking: HashSet<i64>,
}

/// Counts the side-effecting and the logging path separately.
#[derive(Default)]
pub struct SpySink {
    state: Mutex<SinkState>,
}

impl SpySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, id: i64) {
        self.state.lock().unwrap().failing.insert(id);
    }

    pub fn panic_on(&self, id: i64) {
        self.state.lock().unwrap().panicking.insert(id);
    }

    pub fn sent(&self) -> Vec<i64> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn rehearsed(&self) -> Vec<i64> {
        self.state.lock().unwrap().rehearsed.clone()
    }
}

#[async_trait]
impl DeliverySink for SpySink {
    async fn send(&self, payload: &Notification) -> Result<(), HookError> {
        let id = payload.rec_id.get();
        let mut state = self.state.lock().unwrap();
        if state.panicking.contains(&id) {
            panic!("sink blew up on rec_id={id}");
        }
        if state.failing.contains(&id) {
            return Err(HookError::Delivery {
                id: RecordId::new(id),
                reason: "503".into(),
            });
        }
        state.sent.push(id);
        Ok(())
    }

    fn rehearse(&self, payload: &Notification) {
        self.state.lock().unwrap().rehearsed.push(payload.rec_id.get());
    }
}

/// Every wait fails immediately.
#[derive(Default)]
pub struct BrokenNotifier {
    waits: AtomicU64,
}

impl BrokenNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChangeNotifier for BrokenNotifier {
    async fn wait(&self, _timeout: Duration) -> Result<Wake, HookError> {
        self.waits.fetch_add(1, Ordering::SeqCst);
        Err(HookError::Notifier("watcher gone".into()))
    }

    async fn close(&self) {}
}
