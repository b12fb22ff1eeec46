//! # Process-Wide Client
//!
//! Free functions over one lazily published `KvClient`, for services that
//! want a single shared handle without threading it through their code.
//! Data calls made before `init` wait until `init` runs and the store is
//! reachable.

use std::sync::LazyLock;

use skv_common::KvResult;
use tokio::runtime::Handle;
use tracing::{error, warn};

use crate::client::KvClient;
use crate::config::ClientConfig;
use crate::readiness::ReadinessBarrier;

static CLIENT: LazyLock<ReadinessBarrier<KvClient>> = LazyLock::new(ReadinessBarrier::new);

/// Creates the process-wide client and starts connecting to `seeds`.
///
/// Only the first call made inside a Tokio runtime has an effect. Calls
/// outside a runtime publish nothing, so a later call can still succeed.
/// Every ignored call is logged.
pub fn init<I, S>(seeds: I)
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    if let Err(err) = Handle::try_current() {
        error!(error = %err, "process-wide client init needs a Tokio runtime; ignoring");
        return;
    }
    let client = KvClient::new(ClientConfig::with_seeds(seeds));
    if CLIENT.publish(client).is_err() {
        warn!("process-wide client already initialised; ignoring repeated init");
        return;
    }
    if let Some(client) = CLIENT.get() {
        client.init();
    }
}

/// Returns the process-wide client if `init` has run.
pub fn client() -> Option<&'static KvClient> {
    CLIENT.get()
}

/// See [`KvClient::get`].
pub async fn get(scope: &str, key: &str) -> KvResult<Option<String>> {
    CLIENT.wait().await.get(scope, key).await
}

/// See [`KvClient::set`].
pub async fn set(scope: &str, key: &str, value: &str) -> KvResult<()> {
    CLIENT.wait().await.set(scope, key, value).await
}

/// See [`KvClient::delete`].
pub async fn delete(scope: &str, key: &str) -> KvResult<()> {
    CLIENT.wait().await.delete(scope, key).await
}
