// skv-common - Shared types for the ScopedKV client
//
// This crate defines the scoped key codec and the error taxonomy shared by
// the client and its storage backends.

use std::time::Duration;

pub mod error;
pub mod key;

// Re-export for convenience
pub use error::*;
pub use key::*;

/// Lifetime of every record written by `set` (60 days).
pub const RECORD_TTL: Duration = Duration::from_secs(5_184_000);
