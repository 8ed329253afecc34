//! Propagation policy: a pure decision over the requested propagation and
//! whether a physical transaction is already bound.

use crate::definition::Propagation;
use crate::error::{TransactionError, TransactionResult};

/// What `begin` does for a new logical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Participate in the bound physical transaction.
    Join,
    /// Open and bind a fresh physical transaction.
    OpenNew,
    /// Park the bound physical transaction, then open a fresh one.
    SuspendAndOpenNew,
}

impl Decision {
    /// Whether the resulting scope owns its physical transaction.
    pub fn is_new(&self) -> bool {
        !matches!(self, Decision::Join)
    }
}

/// Resolve a propagation request.
pub fn resolve(propagation: Propagation, has_active_physical: bool) -> TransactionResult<Decision> {
    match (propagation, has_active_physical) {
        (Propagation::Required, true) => Ok(Decision::Join),
        (Propagation::Required, false) => Ok(Decision::OpenNew),
        (Propagation::RequiresNew, true) => Ok(Decision::SuspendAndOpenNew),
        (Propagation::RequiresNew, false) => Ok(Decision::OpenNew),
        (other, _) => Err(TransactionError::configuration(format!(
            "propagation {other} is not supported"
        ))),
    }
}
