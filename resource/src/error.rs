//! Resource error types.

use std::fmt;

use thiserror::Error;

/// The resource-level operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceOp {
    /// Obtaining a connection from the provider.
    Acquire,
    Begin,
    Commit,
    Rollback,
}

impl fmt::Display for ResourceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceOp::Acquire => "acquire",
            ResourceOp::Begin => "begin",
            ResourceOp::Commit => "commit",
            ResourceOp::Rollback => "rollback",
        };
        f.write_str(name)
    }
}

/// A failure reported by the underlying resource (connection lost, refused
/// commit, ...). The coordinator propagates it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resource fault during {op}: {message}")]
pub struct ResourceFault {
    pub op: ResourceOp,
    pub message: String,
}

impl ResourceFault {
    pub fn new(op: ResourceOp, message: impl Into<String>) -> Self {
        Self {
            op,
            message: message.into(),
        }
    }

    pub fn acquire(message: impl Into<String>) -> Self {
        Self::new(ResourceOp::Acquire, message)
    }

    pub fn begin(message: impl Into<String>) -> Self {
        Self::new(ResourceOp::Begin, message)
    }

    pub fn commit(message: impl Into<String>) -> Self {
        Self::new(ResourceOp::Commit, message)
    }

    pub fn rollback(message: impl Into<String>) -> Self {
        Self::new(ResourceOp::Rollback, message)
    }
}

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceFault>;
