//! # Connection Manager
//!
//! Purpose: Bring up the single shared session in the background and publish
//! it through the readiness barrier.
//!
//! ## Design Principles
//! 1. **Never Block Startup**: `init` spawns the connect loop and returns.
//! 2. **Never Give Up**: Failed attempts are logged and retried after a fixed
//!    delay, without an attempt limit.
//! 3. **Single Session**: The session is published once and shared through
//!    an `Arc`; it is never replaced or closed here.
//! 4. **Idempotent Init**: Only the first `init` spawns the connect loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::time;
use tracing::{error, info, warn};

use crate::backend::{ConnectTarget, Connector};
use crate::config::ClientConfig;
use crate::readiness::ReadinessBarrier;

struct ManagerInner<C: Connector> {
    config: ClientConfig,
    connector: C,
    session: ReadinessBarrier<Arc<C::Session>>,
    started: AtomicBool,
    attempts: AtomicU64,
}

/// Owns the lifecycle of the shared store session.
pub struct ConnectionManager<C: Connector> {
    inner: Arc<ManagerInner<C>>,
}

impl<C: Connector> Clone for ConnectionManager<C> {
    fn clone(&self) -> Self {
        ConnectionManager {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> ConnectionManager<C> {
    pub fn new(config: ClientConfig, connector: C) -> Self {
        ConnectionManager {
            inner: Arc::new(ManagerInner {
                config,
                connector,
                session: ReadinessBarrier::new(),
                started: AtomicBool::new(false),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Starts the background connect loop and returns immediately.
    ///
    /// Returns false, without spawning anything, when the loop was already
    /// started by an earlier call or when no Tokio runtime is running. A call
    /// rejected for lack of a runtime leaves the manager startable.
    pub fn init(&self) -> bool {
        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(err) => {
                error!(error = %err, "connection manager init needs a Tokio runtime; ignoring");
                return false;
            }
        };
        if self.inner.started.swap(true, Ordering::AcqRel) {
            warn!("connection manager already initialised; ignoring repeated init");
            return false;
        }

        let inner = Arc::clone(&self.inner);
        runtime.spawn(async move { inner.establish().await });
        true
    }

    /// Returns true once the session has been established.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.inner.session.is_ready()
    }

    /// Number of connection attempts made so far.
    #[inline]
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::Acquire)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn connector(&self) -> &C {
        &self.inner.connector
    }

    /// Waits for readiness and returns the shared session.
    pub async fn session(&self) -> &Arc<C::Session> {
        self.inner.session.wait().await
    }
}

impl<C: Connector> ManagerInner<C> {
    async fn establish(&self) {
        let target = ConnectTarget::from(&self.config);
        let delay = self.config.retry_delay();

        loop {
            let attempt = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;
            match self.connector.connect(&target).await {
                Ok(session) => {
                    // Only this loop publishes, and it runs once per manager.
                    let published = self.session.publish(Arc::new(session));
                    debug_assert!(published.is_ok(), "session published twice");
                    info!(attempt, seeds = ?target.seeds, "backing store session established");
                    return;
                }
                Err(err) => {
                    warn!(
                        attempt,
                        error = %err,
                        retry_in_ms = delay.as_millis() as u64,
                        "backing store connection failed; retrying"
                    );
                }
            }
            time::sleep(delay).await;
        }
    }
}
