//! Logical scopes.

use crate::definition::TransactionDefinition;
use crate::id::{ContextId, ScopeId, TransactionId};

/// Handle to one logical scope, returned by `begin` and released by exactly
/// one of `commit` or `rollback`.
///
/// Releasing the same handle twice is a usage fault.
#[derive(Debug)]
#[must_use = "a scope must be released with commit or rollback"]
pub struct ScopeHandle {
    pub(crate) context: ContextId,
    pub(crate) id: ScopeId,
    pub(crate) transaction: TransactionId,
    pub(crate) is_new: bool,
    pub(crate) definition: TransactionDefinition,
}

impl ScopeHandle {
    pub fn id(&self) -> ScopeId {
        self.id
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// The physical transaction this scope participates in.
    pub fn transaction(&self) -> TransactionId {
        self.transaction
    }

    /// Whether this scope owns (opened) its physical transaction.
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    pub fn definition(&self) -> &TransactionDefinition {
        &self.definition
    }
}

/// Context-side record of an active scope.
#[derive(Debug, Clone)]
pub(crate) struct LogicalScope {
    pub(crate) id: ScopeId,
    pub(crate) is_new: bool,
    /// Set through `set_rollback_only` on this scope.
    pub(crate) local_rollback_only: bool,
}

impl LogicalScope {
    pub(crate) fn new(id: ScopeId, is_new: bool) -> Self {
        Self {
            id,
            is_new,
            local_rollback_only: false,
        }
    }
}
