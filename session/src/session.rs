//! Session: one execution path's view of the coordinator.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error};
use txscope_resource::{ResourceHandle, ResourceProvider};
use txscope_transaction::{
    ContextId, ScopeHandle, TransactionContext, TransactionCoordinator, TransactionDefinition,
    TransactionError, TransactionResult,
};

use crate::classify::{Classify, Disposition};

type Connection<P> = <<P as ResourceProvider>::Handle as ResourceHandle>::Connection;

/// A unit-of-work runner bound to one transaction context.
///
/// Nested calls to [`Session::transactional`] compose according to their
/// definitions' propagation.
pub struct Session<'c, P: ResourceProvider> {
    coordinator: &'c TransactionCoordinator<P>,
    context: TransactionContext<P::Handle>,
}

impl<'c, P: ResourceProvider> Session<'c, P> {
    /// Create a session with a fresh context.
    pub fn new(coordinator: &'c TransactionCoordinator<P>) -> Self {
        Self {
            coordinator,
            context: coordinator.context(),
        }
    }

    pub fn id(&self) -> ContextId {
        self.context.id()
    }

    pub fn coordinator(&self) -> &'c TransactionCoordinator<P> {
        self.coordinator
    }

    pub fn context(&self) -> &TransactionContext<P::Handle> {
        &self.context
    }

    /// Check if a physical transaction is bound.
    pub fn is_actual_transaction_active(&self) -> bool {
        self.context.is_actual_transaction_active()
    }

    /// Working connection of the bound transaction.
    pub fn connection(&mut self) -> TransactionResult<&mut Connection<P>> {
        self.context.connection_mut()
    }

    pub fn is_rollback_only(&self, scope: &ScopeHandle) -> TransactionResult<bool> {
        self.context.is_rollback_only(scope)
    }

    /// Mark `scope` so that it rolls back instead of committing.
    pub fn set_rollback_only(&mut self, scope: &ScopeHandle) -> TransactionResult<()> {
        self.coordinator.set_rollback_only(&mut self.context, scope)
    }

    /// Run `work` inside a scope opened with the coordinator's default
    /// definition.
    pub fn transactional_default<T, E, F>(&mut self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self, &ScopeHandle) -> Result<T, E>,
        E: Classify + From<TransactionError> + fmt::Debug,
    {
        let definition = self.coordinator.config().default_definition.clone();
        self.transactional(&definition, work)
    }

    /// Run `work` inside a scope opened with `definition`.
    ///
    /// - `Ok` commits the scope.
    /// - `Err` consults [`Classify::disposition`]: `Rollback` rolls the scope
    ///   back, `Commit` commits it, and the error is returned either way.
    /// - A panic rolls the scope back and resumes unwinding.
    ///
    /// Failures of the release itself take precedence over the unit of
    /// work's error, which is logged.
    pub fn transactional<T, E, F>(&mut self, definition: &TransactionDefinition, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self, &ScopeHandle) -> Result<T, E>,
        E: Classify + From<TransactionError> + fmt::Debug,
    {
        let scope = self.coordinator.begin(&mut self.context, definition)?;
        debug!(
            session = %self.id(),
            scope = %scope.id(),
            new = scope.is_new(),
            name = definition.display_name(),
            "entering transactional scope"
        );

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| work(self, &scope)));

        match outcome {
            Ok(Ok(value)) => {
                self.coordinator.commit(&mut self.context, &scope)?;
                Ok(value)
            }
            Ok(Err(err)) => match err.disposition() {
                Disposition::Rollback => {
                    debug!(scope = %scope.id(), error = ?err, "rolling back after failure");
                    if let Err(rollback_err) = self.coordinator.rollback(&mut self.context, &scope)
                    {
                        error!(
                            scope = %scope.id(),
                            error = ?err,
                            "application error overridden by rollback error"
                        );
                        return Err(rollback_err.into());
                    }
                    Err(err)
                }
                Disposition::Commit => {
                    debug!(scope = %scope.id(), error = ?err, "committing despite recoverable failure");
                    if let Err(commit_err) = self.coordinator.commit(&mut self.context, &scope) {
                        error!(
                            scope = %scope.id(),
                            error = ?err,
                            "application error overridden by commit error"
                        );
                        return Err(commit_err.into());
                    }
                    Err(err)
                }
            },
            Err(payload) => {
                if let Err(rollback_err) = self.coordinator.rollback(&mut self.context, &scope) {
                    error!(
                        scope = %scope.id(),
                        error = %rollback_err,
                        "rollback after panic failed"
                    );
                }
                panic::resume_unwind(payload)
            }
        }
    }
}
