//! # Scoped Client API
//!
//! Purpose: Expose get/set/delete over the shared table, namespaced by a
//! caller-chosen scope and gated on connection readiness.
//!
//! ## Design Principles
//! 1. **Facade Pattern**: `KvClient` hides the connection manager, readiness
//!    barrier and key encoding.
//! 2. **Miss Is A Value**: A missing or expired row is `Ok(None)`.
//! 3. **One Round-Trip**: Each call issues exactly one query and never
//!    retries; failures come back as `database_error`.

use skv_common::{KvError, KvResult, ScopedKey, StoreError, RECORD_TTL};
use tracing::debug;

use crate::backend::{Connector, Session};
use crate::config::ClientConfig;
use crate::manager::ConnectionManager;
use crate::net::RespConnector;

/// Client for the shared scoped key-value table.
///
/// Construct it, call `init` once during startup, then share it (it is
/// cheap to clone). Data calls made before the store is reachable wait for
/// the connection instead of failing.
///
/// ```rust,no_run
/// use skv_client::{ClientConfig, KvClient};
///
/// # async fn demo() -> skv_client::KvResult<()> {
/// let client = KvClient::new(ClientConfig::with_seeds(["10.0.0.5:6379"]));
/// client.init();
/// client.set("user", "324234", "onetwothree").await?;
/// assert_eq!(client.get("user", "324234").await?.as_deref(), Some("onetwothree"));
/// # Ok(())
/// # }
/// ```
pub struct KvClient<C: Connector = RespConnector> {
    manager: ConnectionManager<C>,
}

impl<C: Connector> Clone for KvClient<C> {
    fn clone(&self) -> Self {
        KvClient {
            manager: self.manager.clone(),
        }
    }
}

impl KvClient<RespConnector> {
    /// Creates a client for a RESP2 store.
    pub fn new(config: ClientConfig) -> Self {
        Self::with_connector(config, RespConnector)
    }
}

impl<C: Connector> KvClient<C> {
    /// Creates a client over a custom backend.
    pub fn with_connector(config: ClientConfig, connector: C) -> Self {
        KvClient {
            manager: ConnectionManager::new(config, connector),
        }
    }

    /// Starts connecting in the background. Returns false on repeat calls
    /// and when called outside a Tokio runtime.
    pub fn init(&self) -> bool {
        self.manager.init()
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        self.manager.is_ready()
    }

    /// Waits until the shared session is established.
    pub async fn wait_until_ready(&self) {
        self.manager.session().await;
    }

    pub fn manager(&self) -> &ConnectionManager<C> {
        &self.manager
    }

    /// Reads the value stored under `key` in `scope`.
    ///
    /// Returns `Ok(None)` when the key was never written, was deleted, or has
    /// expired.
    pub async fn get(&self, scope: &str, key: &str) -> KvResult<Option<String>> {
        let session = self.manager.session().await;
        let scoped = ScopedKey::new(scope, key).encode();
        debug!(key = %scoped, "get");

        match session.get(&scoped).await {
            Ok(value) => Ok(Some(value)),
            Err(StoreError::NotFound) => Ok(None),
            Err(err) => Err(KvError::database(err, format!("unable to read key {scoped}"))),
        }
    }

    /// Stores `value` under `key` in `scope`, replacing any previous value
    /// and restarting the 60-day expiry.
    pub async fn set(&self, scope: &str, key: &str, value: &str) -> KvResult<()> {
        let session = self.manager.session().await;
        let scoped = ScopedKey::new(scope, key).encode();
        debug!(key = %scoped, len = value.len(), "set");

        session
            .upsert(&scoped, value, RECORD_TTL)
            .await
            .map_err(|err| KvError::database(err, format!("unable to write key {scoped}")))
    }

    /// Removes `key` from `scope`. Removing a missing key succeeds.
    pub async fn delete(&self, scope: &str, key: &str) -> KvResult<()> {
        let session = self.manager.session().await;
        let scoped = ScopedKey::new(scope, key).encode();
        debug!(key = %scoped, "delete");

        match session.delete(&scoped).await {
            Ok(()) | Err(StoreError::NotFound) => Ok(()),
            Err(err) => Err(KvError::database(err, format!("unable to delete key {scoped}"))),
        }
    }
}
