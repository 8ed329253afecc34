//! txscope Transaction
//!
//! Propagation-aware transaction coordination: many logical scopes, one
//! physical transaction at a time per context.
//!
//! Responsibilities:
//! - Resolve a requested propagation against the context (join, open new,
//!   suspend and open new)
//! - Keep the LIFO stack of logical scopes and the stack of suspended bindings
//! - Implement BEGIN/COMMIT/ROLLBACK with sticky rollback-only semantics
//! - Surface resource faults unchanged and unexpected rollbacks distinctly

mod config;
mod context;
mod coordinator;
mod definition;
mod error;
mod id;
mod physical;
pub mod policy;
mod scope;

pub use config::CoordinatorConfig;
pub use context::TransactionContext;
pub use coordinator::TransactionCoordinator;
pub use definition::{Isolation, Propagation, TransactionDefinition};
pub use error::{ErrorKind, TransactionError, TransactionResult};
pub use id::{ContextId, ScopeId, TransactionId};
pub use physical::{PhysicalTransaction, TransactionStatus};
pub use policy::Decision;
pub use scope::ScopeHandle;
