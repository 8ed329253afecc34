//! In-memory resource provider.
//!
//! `MemoryStore` keeps committed rows in a shared table map. Each handle it
//! hands out buffers writes on its own connection and only publishes them on
//! commit, so a rolled-back transaction leaves the store untouched. Every
//! lifecycle call is recorded as a [`ResourceEvent`] so callers can assert
//! exactly which physical actions happened.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::error::{ResourceFault, ResourceOp, ResourceResult};
use crate::handle::{ResourceHandle, ResourceProvider};

/// Identifier of a connection handed out by a [`MemoryStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl ConnectionId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn{}", self.0)
    }
}

/// A physical action observed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceEvent {
    Begin(ConnectionId),
    Commit(ConnectionId),
    Rollback(ConnectionId),
}

impl ResourceEvent {
    pub fn connection(&self) -> ConnectionId {
        match self {
            ResourceEvent::Begin(id) | ResourceEvent::Commit(id) | ResourceEvent::Rollback(id) => {
                *id
            }
        }
    }
}

type Table = BTreeMap<String, String>;

#[derive(Debug, Default)]
struct StoreInner {
    tables: BTreeMap<String, Table>,
    events: Vec<ResourceEvent>,
    /// One-shot faults, consumed by the next matching operation.
    faults: HashMap<ResourceOp, String>,
    next_connection: u64,
}

impl StoreInner {
    fn take_fault(&mut self, op: ResourceOp) -> ResourceResult<()> {
        match self.faults.remove(&op) {
            Some(message) => Err(ResourceFault::new(op, message)),
            None => Ok(()),
        }
    }
}

/// Shared in-memory store. Cloning yields another handle to the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a committed row.
    pub fn get(&self, table: &str, key: &str) -> Option<String> {
        self.inner
            .lock()
            .tables
            .get(table)
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Check whether a committed row exists.
    pub fn contains(&self, table: &str, key: &str) -> bool {
        self.get(table, key).is_some()
    }

    /// Number of committed rows in a table.
    pub fn count(&self, table: &str) -> usize {
        self.inner.lock().tables.get(table).map_or(0, |rows| rows.len())
    }

    /// All committed rows of a table, ordered by key.
    pub fn rows(&self, table: &str) -> Vec<(String, String)> {
        self.inner
            .lock()
            .tables
            .get(table)
            .map(|rows| rows.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }

    /// Every lifecycle call observed so far, in order.
    pub fn events(&self) -> Vec<ResourceEvent> {
        self.inner.lock().events.clone()
    }

    pub fn begins(&self) -> usize {
        self.count_events(|e| matches!(e, ResourceEvent::Begin(_)))
    }

    pub fn commits(&self) -> usize {
        self.count_events(|e| matches!(e, ResourceEvent::Commit(_)))
    }

    pub fn rollbacks(&self) -> usize {
        self.count_events(|e| matches!(e, ResourceEvent::Rollback(_)))
    }

    /// Make the next `op` on any connection fail with `message`.
    pub fn inject_fault(&self, op: ResourceOp, message: impl Into<String>) {
        self.inner.lock().faults.insert(op, message.into());
    }

    fn count_events(&self, pred: impl Fn(&ResourceEvent) -> bool) -> usize {
        self.inner.lock().events.iter().filter(|e| pred(e)).count()
    }
}

impl ResourceProvider for MemoryStore {
    type Handle = MemoryHandle;

    fn acquire(&self) -> ResourceResult<MemoryHandle> {
        let mut inner = self.inner.lock();
        inner.take_fault(ResourceOp::Acquire)?;
        inner.next_connection += 1;
        let id = ConnectionId(inner.next_connection);
        trace!(connection = %id, "acquired connection");
        Ok(MemoryHandle {
            state: HandleState::Idle,
            connection: MemoryConnection {
                id,
                store: Arc::clone(&self.inner),
                pending: Vec::new(),
            },
        })
    }
}

#[derive(Debug, Clone)]
enum Write {
    Put {
        table: String,
        key: String,
        value: String,
    },
    Delete {
        table: String,
        key: String,
    },
}

/// The working surface of one memory connection.
///
/// Writes are buffered until the owning handle commits; reads see the
/// connection's own pending writes on top of committed data.
#[derive(Debug)]
pub struct MemoryConnection {
    id: ConnectionId,
    store: Arc<Mutex<StoreInner>>,
    pending: Vec<Write>,
}

impl MemoryConnection {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn put(&mut self, table: &str, key: &str, value: impl Into<String>) {
        self.pending.push(Write::Put {
            table: table.to_string(),
            key: key.to_string(),
            value: value.into(),
        });
    }

    pub fn delete(&mut self, table: &str, key: &str) {
        self.pending.push(Write::Delete {
            table: table.to_string(),
            key: key.to_string(),
        });
    }

    pub fn get(&self, table: &str, key: &str) -> Option<String> {
        // Latest pending write for the key wins.
        for write in self.pending.iter().rev() {
            match write {
                Write::Put { table: t, key: k, value } if t == table && k == key => {
                    return Some(value.clone());
                }
                Write::Delete { table: t, key: k } if t == table && k == key => return None,
                _ => {}
            }
        }
        self.store
            .lock()
            .tables
            .get(table)
            .and_then(|rows| rows.get(key).cloned())
    }

    /// Number of writes not yet committed.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandleState {
    Idle,
    Active,
    Committed,
    RolledBack,
}

/// Lifecycle wrapper around a [`MemoryConnection`].
#[derive(Debug)]
pub struct MemoryHandle {
    state: HandleState,
    connection: MemoryConnection,
}

impl MemoryHandle {
    pub fn id(&self) -> ConnectionId {
        self.connection.id
    }

    fn expect_state(&self, expected: HandleState, op: ResourceOp) -> ResourceResult<()> {
        if self.state != expected {
            return Err(ResourceFault::new(
                op,
                format!("{} is {:?}, expected {:?}", self.id(), self.state, expected),
            ));
        }
        Ok(())
    }
}

impl ResourceHandle for MemoryHandle {
    type Connection = MemoryConnection;

    fn begin(&mut self) -> ResourceResult<()> {
        self.expect_state(HandleState::Idle, ResourceOp::Begin)?;
        let mut inner = self.connection.store.lock();
        inner.take_fault(ResourceOp::Begin)?;
        inner.events.push(ResourceEvent::Begin(self.connection.id));
        drop(inner);
        self.state = HandleState::Active;
        trace!(connection = %self.id(), "begin");
        Ok(())
    }

    fn commit(&mut self) -> ResourceResult<()> {
        self.expect_state(HandleState::Active, ResourceOp::Commit)?;
        let mut inner = self.connection.store.lock();
        inner.take_fault(ResourceOp::Commit)?;
        for write in self.connection.pending.drain(..) {
            match write {
                Write::Put { table, key, value } => {
                    inner.tables.entry(table).or_default().insert(key, value);
                }
                Write::Delete { table, key } => {
                    if let Some(rows) = inner.tables.get_mut(&table) {
                        rows.remove(&key);
                    }
                }
            }
        }
        inner.events.push(ResourceEvent::Commit(self.connection.id));
        drop(inner);
        self.state = HandleState::Committed;
        trace!(connection = %self.id(), "commit");
        Ok(())
    }

    fn rollback(&mut self) -> ResourceResult<()> {
        self.expect_state(HandleState::Active, ResourceOp::Rollback)?;
        let mut inner = self.connection.store.lock();
        inner.take_fault(ResourceOp::Rollback)?;
        inner.events.push(ResourceEvent::Rollback(self.connection.id));
        drop(inner);
        self.connection.pending.clear();
        self.state = HandleState::RolledBack;
        trace!(connection = %self.id(), "rollback");
        Ok(())
    }

    fn connection(&mut self) -> &mut MemoryConnection {
        &mut self.connection
    }
}
