//! Transaction coordinator: begin, commit and rollback of logical scopes.

use tracing::{debug, error, warn};
use txscope_resource::{ResourceHandle, ResourceProvider};

use crate::config::CoordinatorConfig;
use crate::context::TransactionContext;
use crate::definition::TransactionDefinition;
use crate::error::{TransactionError, TransactionResult};
use crate::physical::PhysicalTransaction;
use crate::policy::{self, Decision};
use crate::scope::ScopeHandle;

/// Coordinates logical scopes onto physical transactions.
///
/// The coordinator itself is stateless between calls: all per-path state
/// lives in the [`TransactionContext`] passed to each operation, so one
/// coordinator can serve many contexts (and threads) at once.
pub struct TransactionCoordinator<P> {
    provider: P,
    config: CoordinatorConfig,
}

impl<P: ResourceProvider> TransactionCoordinator<P> {
    /// Create a coordinator with the default configuration.
    pub fn new(provider: P) -> Self {
        Self::with_config(provider, CoordinatorConfig::default())
    }

    pub fn with_config(provider: P, config: CoordinatorConfig) -> Self {
        Self { provider, config }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Create an empty context for a new execution path.
    pub fn context(&self) -> TransactionContext<P::Handle> {
        TransactionContext::new()
    }

    // ========== Transaction Lifecycle ==========

    /// Open a logical scope according to `definition`.
    ///
    /// Either joins the bound physical transaction or opens a new one,
    /// suspending the bound one first for `REQUIRES_NEW`. If opening fails
    /// after a suspension, the suspended binding is restored before the
    /// fault is returned.
    pub fn begin(
        &self,
        ctx: &mut TransactionContext<P::Handle>,
        definition: &TransactionDefinition,
    ) -> TransactionResult<ScopeHandle> {
        let decision = policy::resolve(
            definition.propagation,
            ctx.is_actual_transaction_active(),
        )?;

        match decision {
            Decision::Join => {
                let scope = ctx.push_scope(definition, false)?;
                debug!(
                    scope = %scope.id(),
                    transaction = %scope.transaction(),
                    name = definition.display_name(),
                    "participating in existing transaction"
                );
                Ok(scope)
            }
            Decision::OpenNew => self.open(ctx, definition, false),
            Decision::SuspendAndOpenNew => {
                ctx.suspend();
                self.open(ctx, definition, true).inspect_err(|_| ctx.resume())
            }
        }
    }

    /// Release `scope` with a commit request.
    ///
    /// A participating scope only leaves the stack. An owning scope commits
    /// the physical transaction, unless it was marked rollback-only, in which
    /// case it rolls back and reports [`TransactionError::UnexpectedRollback`].
    /// A binding suspended for this transaction is resumed on every outcome.
    pub fn commit(
        &self,
        ctx: &mut TransactionContext<P::Handle>,
        scope: &ScopeHandle,
    ) -> TransactionResult<()> {
        ctx.check_top(scope)?;
        let entry = ctx.pop_scope()?;

        if !entry.is_new {
            let physical = ctx.physical_mut()?;
            if entry.local_rollback_only {
                debug!(
                    scope = %scope.id(),
                    transaction = %physical.id(),
                    "participating scope requested rollback, marking transaction rollback-only"
                );
                physical.mark_rollback_only();
            } else if self.config.fail_early_on_global_rollback_only
                && physical.is_rollback_only()
            {
                warn!(
                    scope = %scope.id(),
                    transaction = %physical.id(),
                    "participating commit on rollback-only transaction"
                );
                return Err(TransactionError::unexpected_rollback(physical.id()));
            }
            return Ok(());
        }

        let mut physical = ctx.release()?;
        let result = self.complete_commit(&mut physical, entry.local_rollback_only);
        if physical.resumes_outer() {
            ctx.resume();
        }
        result
    }

    /// Release `scope` with a rollback request.
    ///
    /// An owning scope rolls the physical transaction back. A participating
    /// scope leaves the resource alone and marks the shared transaction
    /// rollback-only, leaving the physical rollback to the owner.
    pub fn rollback(
        &self,
        ctx: &mut TransactionContext<P::Handle>,
        scope: &ScopeHandle,
    ) -> TransactionResult<()> {
        ctx.check_top(scope)?;
        let entry = ctx.pop_scope()?;

        if !entry.is_new {
            let physical = ctx.physical_mut()?;
            debug!(
                scope = %scope.id(),
                transaction = %physical.id(),
                "participating transaction failed, marking existing transaction as rollback-only"
            );
            physical.mark_rollback_only();
            return Ok(());
        }

        let mut physical = ctx.release()?;
        debug!(transaction = %physical.id(), "rolling back transaction");
        let result = physical.rollback();
        if physical.resumes_outer() {
            ctx.resume();
        }
        result
    }

    /// Mark `scope` so that its commit resolves to a rollback.
    ///
    /// For an owning scope the rollback is silent, since the caller asked
    /// for it. For a participating scope the mark reaches the shared
    /// transaction when the scope commits.
    pub fn set_rollback_only(
        &self,
        ctx: &mut TransactionContext<P::Handle>,
        scope: &ScopeHandle,
    ) -> TransactionResult<()> {
        let entry = ctx.scope_mut(scope)?;
        entry.local_rollback_only = true;
        debug!(scope = %scope.id(), "scope marked rollback-only");
        Ok(())
    }

    // ========== Internal Helpers ==========

    fn open(
        &self,
        ctx: &mut TransactionContext<P::Handle>,
        definition: &TransactionDefinition,
        resumes_outer: bool,
    ) -> TransactionResult<ScopeHandle> {
        let mut handle = self.provider.acquire()?;
        handle.begin()?;

        let physical = PhysicalTransaction::new(ctx.next_transaction_id(), handle, resumes_outer);
        debug!(
            transaction = %physical.id(),
            name = definition.display_name(),
            propagation = %definition.propagation,
            isolation = ?definition.isolation,
            read_only = definition.read_only,
            "creating new transaction"
        );
        ctx.bind(physical);
        ctx.push_scope(definition, true)
    }

    fn complete_commit(
        &self,
        physical: &mut PhysicalTransaction<P::Handle>,
        local_rollback_only: bool,
    ) -> TransactionResult<()> {
        if local_rollback_only {
            debug!(transaction = %physical.id(), "transaction code requested rollback");
            return physical.rollback();
        }

        if physical.is_rollback_only() {
            warn!(
                transaction = %physical.id(),
                "global transaction is marked as rollback-only but commit was requested"
            );
            physical.rollback()?;
            return Err(TransactionError::unexpected_rollback(physical.id()));
        }

        debug!(transaction = %physical.id(), "committing transaction");
        match physical.commit() {
            Ok(()) => Ok(()),
            Err(err) => {
                if self.config.rollback_on_commit_failure {
                    if let Err(rollback_err) = physical.rollback() {
                        error!(
                            transaction = %physical.id(),
                            error = %rollback_err,
                            "rollback after failed commit also failed"
                        );
                    }
                }
                Err(err)
            }
        }
    }
}
