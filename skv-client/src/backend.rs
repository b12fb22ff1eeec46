//! # Storage Backend Seam
//!
//! Purpose: Decouple the connection manager and data operations from the
//! wire protocol of the backing store.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: `Connector` opens a `Session`; callers stay
//!    generic over both so tests can swap in the in-memory store.
//! 2. **Distinguishable Miss**: `Session::get` reports a missing row as
//!    `StoreError::NotFound` instead of a generic failure.
//! 3. **Send Futures**: Every returned future is `Send` so the connect loop
//!    can run on a spawned Tokio task.

use std::future::Future;
use std::time::Duration;

use skv_common::StoreError;

use crate::config::ClientConfig;

/// Where and how a connector should open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTarget {
    /// Addresses tried in order.
    pub seeds: Vec<String>,
    /// Budget for opening a connection to one seed.
    pub connect_timeout: Duration,
    /// Deadline for every query issued on the session.
    pub query_timeout: Duration,
}

impl From<&ClientConfig> for ConnectTarget {
    fn from(config: &ClientConfig) -> Self {
        ConnectTarget {
            seeds: config.seeds.clone(),
            connect_timeout: config.connect_timeout(),
            query_timeout: config.query_timeout(),
        }
    }
}

/// Query interface of an established store session.
pub trait Session: Send + Sync + 'static {
    /// Point lookup of a stored key.
    fn get(&self, key: &str) -> impl Future<Output = Result<String, StoreError>> + Send;

    /// Inserts or overwrites a row that expires `ttl` after this write.
    fn upsert(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes a row. Removing a missing row succeeds.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// Opens sessions against a backing store.
pub trait Connector: Send + Sync + 'static {
    type Session: Session;

    /// Makes one connection attempt. The connector honours
    /// `target.connect_timeout` itself.
    fn connect(
        &self,
        target: &ConnectTarget,
    ) -> impl Future<Output = Result<Self::Session, StoreError>> + Send;
}
