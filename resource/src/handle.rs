//! The contract between the coordinator and a physical resource.

use crate::error::ResourceResult;

/// A single physical connection capable of one transaction.
///
/// `begin`, `commit` and `rollback` are each invoked at most once per handle,
/// and only by the coordinator. Application code reaches the resource through
/// [`ResourceHandle::connection`], which exposes the working surface
/// (reads and writes) without the lifecycle calls.
pub trait ResourceHandle {
    /// The working surface units of work operate on.
    type Connection;

    fn begin(&mut self) -> ResourceResult<()>;

    fn commit(&mut self) -> ResourceResult<()>;

    fn rollback(&mut self) -> ResourceResult<()>;

    fn connection(&mut self) -> &mut Self::Connection;
}

/// Hands out fresh resource handles, one per physical transaction.
pub trait ResourceProvider {
    type Handle: ResourceHandle;

    fn acquire(&self) -> ResourceResult<Self::Handle>;
}

impl<P: ResourceProvider + ?Sized> ResourceProvider for &P {
    type Handle = P::Handle;

    fn acquire(&self) -> ResourceResult<Self::Handle> {
        (**self).acquire()
    }
}
