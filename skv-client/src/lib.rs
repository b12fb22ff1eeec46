//! # ScopedKV Client
//!
//! Purpose: Give independent services namespaced access to one shared
//! key-value table, connecting in the background so startup never blocks.
//!
//! ## Design Principles
//! 1. **Background Bring-Up**: `init` spawns a connect loop that retries
//!    forever with a fixed delay.
//! 2. **Readiness Gating**: Data calls wait on a one-shot barrier until the
//!    shared session exists, then pass through lock-free.
//! 3. **Scoped Keys**: `(scope, key)` pairs are encoded injectively, so
//!    services sharing the table never collide.
//! 4. **Pluggable Backend**: RESP2 over TCP by default; an in-memory store
//!    with an injectable clock for tests.

mod backend;
mod client;
mod config;
pub mod global;
mod manager;
mod memory;
mod net;
mod readiness;
mod resp;

pub use backend::{ConnectTarget, Connector, Session};
pub use client::KvClient;
pub use config::{
    ClientConfig, DEFAULT_CONNECT_TIMEOUT, DEFAULT_QUERY_TIMEOUT, DEFAULT_RETRY_DELAY,
    DEFAULT_SEED,
};
pub use manager::ConnectionManager;
pub use memory::{Clock, ManualClock, MemoryConnector, MemorySession, SystemClock};
pub use net::{RespConnector, RespSession};
pub use readiness::ReadinessBarrier;

pub use skv_common::{ErrorKind, KvError, KvResult, ScopedKey, StoreError, RECORD_TTL};
