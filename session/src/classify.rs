//! Error classification: whether a failed unit of work still commits.

use txscope_transaction::TransactionError;

/// What to do with a scope whose unit of work failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The failure is an expected business outcome; keep the work.
    Commit,
    /// The failure invalidates the work.
    Rollback,
}

/// Classifies a unit-of-work error.
///
/// Errors roll back unless they say otherwise. Implement this for your
/// application error type and return [`Disposition::Commit`] for recoverable
/// business outcomes that must still be persisted.
pub trait Classify {
    fn disposition(&self) -> Disposition {
        Disposition::Rollback
    }
}

impl Classify for TransactionError {}
