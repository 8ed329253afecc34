//! The physical transaction: one real begin/commit/rollback on a resource.

use txscope_resource::ResourceHandle;

use crate::error::{TransactionError, TransactionResult};
use crate::id::TransactionId;

/// Lifecycle of a physical transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Open,
    Committed,
    RolledBack,
}

/// A physical transaction bound to a resource handle.
///
/// `rollback_only` and completion are one-way: once marked or completed the
/// transaction never goes back.
#[derive(Debug)]
pub struct PhysicalTransaction<H> {
    id: TransactionId,
    handle: H,
    status: TransactionStatus,
    rollback_only: bool,
    /// Opened by suspending another binding, which must be resumed on
    /// completion.
    resumes_outer: bool,
}

impl<H: ResourceHandle> PhysicalTransaction<H> {
    /// Wrap a handle whose `begin` has already succeeded.
    pub(crate) fn new(id: TransactionId, handle: H, resumes_outer: bool) -> Self {
        Self {
            id,
            handle,
            status: TransactionStatus::Open,
            rollback_only: false,
            resumes_outer,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status != TransactionStatus::Open
    }

    pub fn is_rollback_only(&self) -> bool {
        self.rollback_only
    }

    pub fn resumes_outer(&self) -> bool {
        self.resumes_outer
    }

    pub(crate) fn mark_rollback_only(&mut self) {
        if self.status == TransactionStatus::Open {
            self.rollback_only = true;
        }
    }

    pub(crate) fn connection_mut(&mut self) -> &mut H::Connection {
        self.handle.connection()
    }

    /// Commit on the resource. A failed commit leaves the transaction open
    /// so that a rollback may still be attempted.
    pub(crate) fn commit(&mut self) -> TransactionResult<()> {
        self.ensure_open()?;
        self.handle.commit()?;
        self.status = TransactionStatus::Committed;
        Ok(())
    }

    pub(crate) fn rollback(&mut self) -> TransactionResult<()> {
        self.ensure_open()?;
        self.handle.rollback()?;
        self.status = TransactionStatus::RolledBack;
        Ok(())
    }

    fn ensure_open(&self) -> TransactionResult<()> {
        if self.is_completed() {
            return Err(TransactionError::AlreadyCompleted {
                transaction: self.id,
            });
        }
        Ok(())
    }
}
