//! # In-Memory Backend
//!
//! Provide an in-process store implementing the backend seam, for tests and
//! local development without a running store.
//!
//! ## Usage
//!
//! - `MemoryConnector::new()` stores rows against the system clock.
//! - `MemoryConnector::with_clock(clock)` evaluates TTLs against an injected
//!   clock; pair it with `ManualClock` to step time explicitly.
//! - `fail_connects`, `fail_queries` and `hold_connects` inject failures and
//!   delays so the connect loop and readiness gating can be exercised.
//!
//! ## Design Principles
//!
//! 1. **Shared State**: The connector and every session it opens share one
//!    row map, so the store outlives individual sessions.
//! 2. **TTL On Access**: Expiry is checked on read and expired rows are
//!    purged lazily, matching how the remote store hides them.
//! 3. **Countdown Faults**: Injected failures are counters consumed one per
//!    operation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;

use skv_common::StoreError;

use crate::backend::{ConnectTarget, Connector, Session};

/// Time source used for TTL evaluation.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> Instant;
}

/// Wall clock backed by `Instant::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct ManualClock {
    base: Instant,
    offset: Arc<Mutex<Duration>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        ManualClock {
            base: Instant::now(),
            offset: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    /// Moves the clock forward; clones observe the same time.
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock();
        *offset += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock()
    }
}

#[derive(Debug)]
struct Row {
    value: String,
    expires_at: Instant,
}

struct MemoryShared {
    rows: Mutex<HashMap<String, Row>>,
    clock: Box<dyn Clock>,
    connect_failures: AtomicUsize,
    query_failures: AtomicUsize,
    connect_attempts: AtomicU64,
    gate: watch::Sender<bool>,
}

impl MemoryShared {
    fn get(&self, key: &str) -> Result<String, StoreError> {
        take_fault(&self.query_failures, "query failed")?;
        let now = self.clock.now();
        let mut rows = self.rows.lock();
        match rows.get(key) {
            Some(row) if now < row.expires_at => Ok(row.value.clone()),
            Some(_) => {
                rows.remove(key);
                Err(StoreError::NotFound)
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn upsert(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        take_fault(&self.query_failures, "query failed")?;
        let row = Row {
            value: value.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        self.rows.lock().insert(key.to_string(), row);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        take_fault(&self.query_failures, "query failed")?;
        self.rows.lock().remove(key);
        Ok(())
    }
}

/// Consumes one injected failure if any are pending.
fn take_fault(counter: &AtomicUsize, what: &str) -> Result<(), StoreError> {
    let pending = counter.fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| {
        left.checked_sub(1)
    });
    match pending {
        Ok(_) => Err(StoreError::Injected(what.to_string())),
        Err(_) => Ok(()),
    }
}

/// Connector for the in-process store.
#[derive(Clone)]
pub struct MemoryConnector {
    shared: Arc<MemoryShared>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    /// Creates an empty store on the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Creates an empty store evaluating TTLs against `clock`.
    pub fn with_clock(clock: impl Clock) -> Self {
        let (gate, _) = watch::channel(true);
        MemoryConnector {
            shared: Arc::new(MemoryShared {
                rows: Mutex::new(HashMap::new()),
                clock: Box::new(clock),
                connect_failures: AtomicUsize::new(0),
                query_failures: AtomicUsize::new(0),
                connect_attempts: AtomicU64::new(0),
                gate,
            }),
        }
    }

    /// Makes the next `count` connection attempts fail.
    pub fn fail_connects(&self, count: usize) {
        self.shared.connect_failures.store(count, Ordering::Release);
    }

    /// Makes the next `count` queries fail.
    pub fn fail_queries(&self, count: usize) {
        self.shared.query_failures.store(count, Ordering::Release);
    }

    /// Parks connection attempts until `release_connects` is called.
    pub fn hold_connects(&self) {
        self.shared.gate.send_replace(false);
    }

    pub fn release_connects(&self) {
        self.shared.gate.send_replace(true);
    }

    /// Connection attempts started so far, including held and failed ones.
    pub fn connect_attempts(&self) -> u64 {
        self.shared.connect_attempts.load(Ordering::Acquire)
    }

    /// Stored keys that have not expired, sorted.
    pub fn live_keys(&self) -> Vec<String> {
        let now = self.shared.clock.now();
        let rows = self.shared.rows.lock();
        let mut keys: Vec<String> = rows
            .iter()
            .filter(|(_, row)| now < row.expires_at)
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining lifetime of a stored key, if it is live.
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        let now = self.shared.clock.now();
        let rows = self.shared.rows.lock();
        rows.get(key)
            .and_then(|row| row.expires_at.checked_duration_since(now))
            .filter(|left| !left.is_zero())
    }
}

impl Connector for MemoryConnector {
    type Session = MemorySession;

    async fn connect(&self, _target: &ConnectTarget) -> Result<MemorySession, StoreError> {
        self.shared.connect_attempts.fetch_add(1, Ordering::AcqRel);

        let mut gate = self.shared.gate.subscribe();
        loop {
            let open = *gate.borrow_and_update();
            if open || gate.changed().await.is_err() {
                break;
            }
        }

        take_fault(&self.shared.connect_failures, "connection refused")?;
        Ok(MemorySession {
            shared: Arc::clone(&self.shared),
        })
    }
}

/// Session over the in-process store.
#[derive(Clone)]
pub struct MemorySession {
    shared: Arc<MemoryShared>,
}

impl Session for MemorySession {
    async fn get(&self, key: &str) -> Result<String, StoreError> {
        self.shared.get(key)
    }

    async fn upsert(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        self.shared.upsert(key, value, ttl)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.shared.delete(key)
    }
}
