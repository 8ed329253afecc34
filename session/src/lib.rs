//! txscope Session
//!
//! Scoped transaction demarcation for units of work.
//!
//! Responsibilities:
//! - Own one `TransactionContext` per execution path
//! - Run a unit of work inside a scope and release the scope on every exit
//!   path (success, error, panic)
//! - Decide commit versus rollback for failed work through explicit error
//!   classification

mod classify;
mod session;

pub use classify::{Classify, Disposition};
pub use session::Session;
