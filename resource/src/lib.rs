//! txscope Resource
//!
//! The resource layer the coordinator drives: a physical connection that can
//! begin, commit and roll back exactly once, and the provider that hands such
//! connections out.
//!
//! Responsibilities:
//! - Define the `ResourceHandle` / `ResourceProvider` contract
//! - Define `ResourceFault`, the only failure the resource layer reports
//! - Provide `MemoryStore`, an in-memory provider used by tests and scenarios

mod error;
mod handle;
mod memory;

pub use error::{ResourceFault, ResourceOp, ResourceResult};
pub use handle::{ResourceHandle, ResourceProvider};
pub use memory::{ConnectionId, MemoryConnection, MemoryHandle, MemoryStore, ResourceEvent};
