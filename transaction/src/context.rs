//! Per-execution-path transaction state.

use tracing::debug;
use txscope_resource::ResourceHandle;

use crate::definition::TransactionDefinition;
use crate::error::{TransactionError, TransactionResult};
use crate::id::{ContextId, ScopeId, TransactionId};
use crate::physical::PhysicalTransaction;
use crate::scope::{LogicalScope, ScopeHandle};

/// A physical transaction together with the logical scopes sharing it.
#[derive(Debug)]
pub(crate) struct Binding<H> {
    pub(crate) physical: PhysicalTransaction<H>,
    pub(crate) scopes: Vec<LogicalScope>,
}

impl<H> Binding<H> {
    fn position(&self, scope: ScopeId) -> Option<usize> {
        self.scopes.iter().position(|s| s.id == scope)
    }
}

/// Transaction state for one execution path.
///
/// Holds at most one bound physical transaction with its LIFO stack of
/// logical scopes, plus the bindings suspended by `REQUIRES_NEW` scopes.
/// Contexts are independent: parallel workers each own one.
#[derive(Debug)]
pub struct TransactionContext<H> {
    id: ContextId,
    current: Option<Binding<H>>,
    suspended: Vec<Binding<H>>,
    next_scope: u64,
    next_transaction: u64,
}

impl<H: ResourceHandle> Default for TransactionContext<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ResourceHandle> TransactionContext<H> {
    pub fn new() -> Self {
        Self {
            id: ContextId::next(),
            current: None,
            suspended: Vec::new(),
            next_scope: 0,
            next_transaction: 0,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    // ========== Introspection ==========

    /// Whether a physical transaction is bound right now.
    pub fn is_actual_transaction_active(&self) -> bool {
        self.current.is_some()
    }

    /// Number of active scopes sharing the bound physical transaction.
    pub fn depth(&self) -> usize {
        self.current.as_ref().map_or(0, |b| b.scopes.len())
    }

    /// Number of suspended bindings waiting to be resumed.
    pub fn suspended_count(&self) -> usize {
        self.suspended.len()
    }

    /// The bound physical transaction, if any.
    pub fn current_transaction(&self) -> Option<&PhysicalTransaction<H>> {
        self.current.as_ref().map(|b| &b.physical)
    }

    /// Whether committing `scope` would roll back: either the scope itself
    /// was marked, or its shared physical transaction was.
    pub fn is_rollback_only(&self, scope: &ScopeHandle) -> TransactionResult<bool> {
        let binding = self.current_binding_of(scope)?;
        let local = binding
            .position(scope.id)
            .map_or(false, |pos| binding.scopes[pos].local_rollback_only);
        Ok(local || binding.physical.is_rollback_only())
    }

    /// Working connection of the bound physical transaction.
    pub fn connection_mut(&mut self) -> TransactionResult<&mut H::Connection> {
        self.current
            .as_mut()
            .map(|b| b.physical.connection_mut())
            .ok_or(TransactionError::NoActiveTransaction)
    }

    // ========== Coordinator Support ==========

    pub(crate) fn next_transaction_id(&mut self) -> TransactionId {
        self.next_transaction += 1;
        TransactionId(self.next_transaction)
    }

    /// Bind a freshly opened physical transaction. The previous binding must
    /// have been suspended or released.
    pub(crate) fn bind(&mut self, physical: PhysicalTransaction<H>) {
        debug_assert!(self.current.is_none(), "binding over an active transaction");
        self.current = Some(Binding {
            physical,
            scopes: Vec::new(),
        });
    }

    /// Push a scope onto the bound transaction's stack.
    pub(crate) fn push_scope(
        &mut self,
        definition: &TransactionDefinition,
        is_new: bool,
    ) -> TransactionResult<ScopeHandle> {
        self.next_scope += 1;
        let id = ScopeId(self.next_scope);
        let binding = self
            .current
            .as_mut()
            .ok_or(TransactionError::NoActiveTransaction)?;
        binding.scopes.push(LogicalScope::new(id, is_new));
        Ok(ScopeHandle {
            context: self.id,
            id,
            transaction: binding.physical.id(),
            is_new,
            definition: definition.clone(),
        })
    }

    /// Verify `scope` is the innermost active scope of this context.
    pub(crate) fn check_top(&self, scope: &ScopeHandle) -> TransactionResult<()> {
        self.check_owner(scope)?;
        let innermost = self
            .current
            .as_ref()
            .and_then(|b| b.scopes.last())
            .map(|s| s.id);
        match innermost {
            Some(top) if top == scope.id => Ok(()),
            Some(top) if self.is_known(scope.id) => Err(TransactionError::OutOfOrder {
                scope: scope.id,
                innermost: top,
            }),
            _ => Err(TransactionError::ScopeCompleted { scope: scope.id }),
        }
    }

    /// Pop the innermost scope. Callers check the order first.
    pub(crate) fn pop_scope(&mut self) -> TransactionResult<LogicalScope> {
        self.current
            .as_mut()
            .and_then(|b| b.scopes.pop())
            .ok_or(TransactionError::NoActiveTransaction)
    }

    /// Find an active scope of the bound transaction for marking.
    pub(crate) fn scope_mut(&mut self, scope: &ScopeHandle) -> TransactionResult<&mut LogicalScope> {
        self.current_binding_of(scope)?;
        let binding = self
            .current
            .as_mut()
            .ok_or(TransactionError::NoActiveTransaction)?;
        let pos = binding
            .position(scope.id)
            .ok_or(TransactionError::ScopeCompleted { scope: scope.id })?;
        Ok(&mut binding.scopes[pos])
    }

    pub(crate) fn physical_mut(&mut self) -> TransactionResult<&mut PhysicalTransaction<H>> {
        self.current
            .as_mut()
            .map(|b| &mut b.physical)
            .ok_or(TransactionError::NoActiveTransaction)
    }

    /// Unbind the current physical transaction once its owning scope is done.
    pub(crate) fn release(&mut self) -> TransactionResult<PhysicalTransaction<H>> {
        let binding = self
            .current
            .take()
            .ok_or(TransactionError::NoActiveTransaction)?;
        debug_assert!(binding.scopes.is_empty(), "released with active scopes");
        Ok(binding.physical)
    }

    /// Park the current binding, if any.
    pub(crate) fn suspend(&mut self) {
        if let Some(binding) = self.current.take() {
            debug!(
                context = %self.id,
                transaction = %binding.physical.id(),
                depth = binding.scopes.len(),
                "suspending current transaction"
            );
            self.suspended.push(binding);
        }
    }

    /// Restore the most recently suspended binding.
    pub(crate) fn resume(&mut self) {
        debug_assert!(self.current.is_none(), "resuming over an active transaction");
        if let Some(binding) = self.suspended.pop() {
            debug!(
                context = %self.id,
                transaction = %binding.physical.id(),
                "resuming suspended transaction"
            );
            self.current = Some(binding);
        }
    }

    // ========== Internal Helpers ==========

    fn check_owner(&self, scope: &ScopeHandle) -> TransactionResult<()> {
        if scope.context != self.id {
            return Err(TransactionError::ForeignScope { scope: scope.id });
        }
        Ok(())
    }

    fn is_known(&self, scope: ScopeId) -> bool {
        self.current
            .iter()
            .chain(self.suspended.iter())
            .any(|b| b.position(scope).is_some())
    }

    /// The bound binding, provided `scope` is active in it.
    fn current_binding_of(&self, scope: &ScopeHandle) -> TransactionResult<&Binding<H>> {
        self.check_owner(scope)?;
        if let Some(binding) = self.current.as_ref() {
            if binding.position(scope.id).is_some() {
                return Ok(binding);
            }
        }
        if self.suspended.iter().any(|b| b.position(scope.id).is_some()) {
            return Err(TransactionError::ScopeSuspended { scope: scope.id });
        }
        Err(TransactionError::ScopeCompleted { scope: scope.id })
    }
}
