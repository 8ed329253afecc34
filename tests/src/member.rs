//! Member sign-up with an audit log.

use tracing::info;
use txscope_resource::MemoryStore;
use txscope_session::Session;
use txscope_transaction::TransactionDefinition;

use crate::error::{ServiceError, ServiceResult};

pub const MEMBER_TABLE: &str = "member";
pub const LOG_TABLE: &str = "log";

/// Log messages containing this marker fail to save.
pub const LOG_FAILURE_MARKER: &str = "log-exception";

type MemorySession<'c> = Session<'c, MemoryStore>;

/// Run `work` in a scope when `definition` is set, otherwise in whatever
/// transaction the caller already has.
fn within<T>(
    session: &mut MemorySession<'_>,
    definition: Option<&TransactionDefinition>,
    work: impl FnOnce(&mut MemorySession<'_>) -> ServiceResult<T>,
) -> ServiceResult<T> {
    match definition {
        Some(definition) => session.transactional(definition, |s, _| work(s)),
        None => work(session),
    }
}

pub struct MemberRepository {
    definition: Option<TransactionDefinition>,
}

impl MemberRepository {
    pub fn transactional() -> Self {
        Self {
            definition: Some(TransactionDefinition::required().with_name("member.save")),
        }
    }

    /// Saves only inside a transaction opened by the caller.
    pub fn participating() -> Self {
        Self { definition: None }
    }

    pub fn save(&self, session: &mut MemorySession<'_>, username: &str) -> ServiceResult<()> {
        within(session, self.definition.as_ref(), |s| {
            info!(username, "saving member");
            s.connection()?.put(MEMBER_TABLE, username, username);
            Ok(())
        })
    }

    pub fn find(store: &MemoryStore, username: &str) -> Option<String> {
        store.get(MEMBER_TABLE, username)
    }
}

pub struct LogRepository {
    definition: Option<TransactionDefinition>,
}

impl LogRepository {
    /// Joins the caller's transaction when there is one.
    pub fn transactional() -> Self {
        Self {
            definition: Some(TransactionDefinition::required().with_name("log.save")),
        }
    }

    /// Always writes in an independent transaction.
    pub fn requires_new() -> Self {
        Self {
            definition: Some(TransactionDefinition::requires_new().with_name("log.save")),
        }
    }

    pub fn participating() -> Self {
        Self { definition: None }
    }

    pub fn save(&self, session: &mut MemorySession<'_>, message: &str) -> ServiceResult<()> {
        within(session, self.definition.as_ref(), |s| {
            info!(message, "saving log");
            s.connection()?.put(LOG_TABLE, message, message);
            if message.contains(LOG_FAILURE_MARKER) {
                info!(message, "log save failed");
                return Err(ServiceError::log_failure(message));
            }
            Ok(())
        })
    }

    pub fn find(store: &MemoryStore, message: &str) -> Option<String> {
        store.get(LOG_TABLE, message)
    }
}

pub struct MemberService {
    members: MemberRepository,
    logs: LogRepository,
    definition: Option<TransactionDefinition>,
}

impl MemberService {
    /// A service without its own transaction: each repository call stands
    /// alone.
    pub fn new(members: MemberRepository, logs: LogRepository) -> Self {
        Self {
            members,
            logs,
            definition: None,
        }
    }

    /// Wrap every service call in a `REQUIRED` scope.
    pub fn transactional(mut self) -> Self {
        self.definition = Some(TransactionDefinition::required().with_name("member.join"));
        self
    }

    /// Save the member, then the log entry. A log failure fails the call.
    pub fn join(&self, session: &mut MemorySession<'_>, username: &str) -> ServiceResult<()> {
        within(session, self.definition.as_ref(), |s| {
            info!(username, "== member save start ==");
            self.members.save(s, username)?;
            info!(username, "== log save start ==");
            self.logs.save(s, username)?;
            Ok(())
        })
    }

    /// Like [`MemberService::join`], but a log failure is swallowed so the
    /// sign-up itself returns normally.
    pub fn join_recovering(
        &self,
        session: &mut MemorySession<'_>,
        username: &str,
    ) -> ServiceResult<()> {
        within(session, self.definition.as_ref(), |s| {
            self.members.save(s, username)?;
            if let Err(err) = self.logs.save(s, username) {
                info!(username, error = %err, "log save failed, returning normally");
            }
            Ok(())
        })
    }
}
