//! Transaction error types.

use thiserror::Error;
use txscope_resource::ResourceFault;

use crate::id::{ScopeId, TransactionId};

/// Broad classification of a [`TransactionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested behaviour is unknown or unsupported.
    Configuration,
    /// The caller broke the begin/commit/rollback protocol.
    Usage,
    /// The underlying resource failed.
    Resource,
    /// A commit request resolved to a rollback.
    UnexpectedRollback,
}

/// Transaction errors.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Unknown or unsupported configuration.
    #[error("configuration fault: {message}")]
    Configuration { message: String },

    /// The scope is still active but is not the innermost one.
    #[error("scope {scope} completed out of order: innermost active scope is {innermost}")]
    OutOfOrder { scope: ScopeId, innermost: ScopeId },

    /// The scope was already committed or rolled back.
    #[error("scope {scope} was already completed")]
    ScopeCompleted { scope: ScopeId },

    /// The scope belongs to a binding that is currently suspended.
    #[error("scope {scope} belongs to a suspended transaction")]
    ScopeSuspended { scope: ScopeId },

    /// The scope was begun in another context.
    #[error("scope {scope} belongs to another transaction context")]
    ForeignScope { scope: ScopeId },

    /// The physical transaction was already committed or rolled back.
    #[error("transaction {transaction} was already completed")]
    AlreadyCompleted { transaction: TransactionId },

    /// No physical transaction is bound to the context.
    #[error("no transaction is active")]
    NoActiveTransaction,

    /// Resource-level failure, propagated verbatim.
    #[error(transparent)]
    Resource(#[from] ResourceFault),

    /// Commit was requested, but a participant had marked the transaction
    /// rollback-only; it was rolled back instead.
    #[error("transaction {transaction} rolled back because it has been marked as rollback-only")]
    UnexpectedRollback { transaction: TransactionId },
}

impl TransactionError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn unexpected_rollback(transaction: TransactionId) -> Self {
        Self::UnexpectedRollback { transaction }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            TransactionError::Configuration { .. } => ErrorKind::Configuration,
            TransactionError::OutOfOrder { .. }
            | TransactionError::ScopeCompleted { .. }
            | TransactionError::ScopeSuspended { .. }
            | TransactionError::ForeignScope { .. }
            | TransactionError::AlreadyCompleted { .. }
            | TransactionError::NoActiveTransaction => ErrorKind::Usage,
            TransactionError::Resource(_) => ErrorKind::Resource,
            TransactionError::UnexpectedRollback { .. } => ErrorKind::UnexpectedRollback,
        }
    }

    pub fn is_usage_fault(&self) -> bool {
        self.kind() == ErrorKind::Usage
    }

    pub fn is_unexpected_rollback(&self) -> bool {
        self.kind() == ErrorKind::UnexpectedRollback
    }
}

/// Result type for transaction operations.
pub type TransactionResult<T> = Result<T, TransactionError>;
