//! txscope Scenario Services
//!
//! Small application services built on `txscope-session`, used by the
//! integration tests to exercise propagation end to end.
//!
//! # Structure
//!
//! - **member** - member sign-up that also writes an audit log entry; the
//!   log repository can join the caller's transaction or run in its own
//! - **order** - order payment where an insufficient balance is a business
//!   outcome that still commits, while a system failure rolls back
//!
//! # Example
//!
//! ```ignore
//! use txscope_tests::prelude::*;
//!
//! let fixture = Fixture::new();
//! let mut session = fixture.session();
//! MemberService::new(MemberRepository::transactional(), LogRepository::requires_new())
//!     .join(&mut session, "kim")
//!     .unwrap();
//! ```

pub mod member;
pub mod order;

pub use error::{ServiceError, ServiceResult};
pub use fixture::Fixture;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{ServiceError, ServiceResult};
    pub use crate::fixture::Fixture;
    pub use crate::member::{LogRepository, MemberRepository, MemberService};
    pub use crate::order::{Order, OrderRepository, OrderService, PayStatus};
    pub use txscope_resource::{MemoryStore, ResourceEvent, ResourceOp};
    pub use txscope_session::{Classify, Disposition, Session};
    pub use txscope_transaction::{
        CoordinatorConfig, ErrorKind, Propagation, TransactionCoordinator, TransactionDefinition,
        TransactionError,
    };
}
