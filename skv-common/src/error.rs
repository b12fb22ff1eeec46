//! # Error Taxonomy
//!
//! Purpose: Separate raw backend failures from the classified errors handed
//! to callers.
//!
//! ## Design Principles
//! 1. **Two Kinds**: A missing row is a value (`None`), never an error; every
//!    other backend failure is a `database_error`.
//! 2. **Root Cause Preserved**: `KvError` keeps the backend error reachable
//!    through `std::error::Error::source`.
//! 3. **Stable Wire Form**: `KvError` serializes to a flat JSON object so
//!    services can forward it unchanged.

use std::error::Error as StdError;
use std::fmt;
use std::time::Duration;

use serde::ser::{Serialize, SerializeStruct, Serializer};
use thiserror::Error;

/// Status attached to every backend failure.
pub const STATUS_INTERNAL: u16 = 500;

/// Result type for caller-facing operations.
pub type KvResult<T> = Result<T, KvError>;

/// Failures reported by a storage backend session or connector.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Point lookup found no live row.
    #[error("not found")]
    NotFound,
    /// Network or IO failure while reading/writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Query or connection attempt exceeded its deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    /// Wire framing or parse error.
    #[error("protocol error")]
    Protocol,
    /// Store answered with an error reply.
    #[error("server error: {message}")]
    Server { message: String },
    /// Reply type did not match the issued command.
    #[error("unexpected response")]
    UnexpectedResponse,
    /// No seed accepted a connection.
    #[error("no reachable seed")]
    NoSeeds,
    /// Failure injected by a test backend.
    #[error("injected failure: {0}")]
    Injected(String),
}

impl StoreError {
    /// Returns true for the lookup-miss condition.
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound)
    }
}

/// Symbolic error kind carried by `KvError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    DatabaseError,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::DatabaseError => "database_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Classified error returned by the data operations.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct KvError {
    status: u16,
    kind: ErrorKind,
    message: String,
    #[source]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

impl KvError {
    /// Wraps a root cause with a status, kind and message.
    pub fn wrap<E>(source: E, status: u16, kind: ErrorKind, message: impl Into<String>) -> Self
    where
        E: Into<Box<dyn StdError + Send + Sync + 'static>>,
    {
        KvError {
            status,
            kind,
            message: message.into(),
            source: source.into(),
        }
    }

    /// Wraps a backend failure as a `database_error` with status 500.
    pub fn database(source: StoreError, message: impl Into<String>) -> Self {
        Self::wrap(source, STATUS_INTERNAL, ErrorKind::DatabaseError, message)
    }

    #[inline]
    pub fn status(&self) -> u16 {
        self.status
    }

    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the root cause as a `StoreError` when it is one.
    pub fn store_error(&self) -> Option<&StoreError> {
        self.source.downcast_ref::<StoreError>()
    }

    /// Renders `{ status, kind, message, cause }` as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "status": self.status,
            "kind": self.kind.as_str(),
            "message": self.message,
            "cause": self.source.to_string(),
        })
    }
}

impl Serialize for KvError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("KvError", 4)?;
        state.serialize_field("status", &self.status)?;
        state.serialize_field("kind", &self.kind)?;
        state.serialize_field("message", &self.message)?;
        state.serialize_field("cause", &self.source.to_string())?;
        state.end()
    }
}
