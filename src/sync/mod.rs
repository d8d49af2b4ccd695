//! Sync Module
//!
//! Concurrency control for the two shared files.
//!
//! ## Disciplines
//! - Record store: strong writer preference, concurrent readers ([`RecordLock`])
//! - Audit log: weak reader preference, concurrent readers ([`LogLock`])
//!
//! Both are built from counting [`Semaphore`]s so that a permit taken by the
//! first reader of a group can be handed back by whichever reader leaves last.
//! The [`Monitor`] bundles one of each and is shared by every handler.
//!
//! ## Usage
//! ```text
//! let _guard = monitor.records().read();   // acquire_reader
//! store.count()?;
//! // guard dropped → release_reader
//! ```

mod semaphore;
mod record_lock;
mod log_lock;
mod monitor;

pub use semaphore::Semaphore;
pub use record_lock::RecordLock;
pub use log_lock::LogLock;
pub use monitor::{Monitor, MonitorSnapshot};

use crate::error::Result;

/// A readers-writers discipline guarding one shared resource
///
/// `acquire_*` block until the discipline admits the caller. Every acquire
/// must be paired with the matching release; a release with no matching
/// acquire fails with `StoreError::Sync` and leaves the counters untouched.
pub trait Discipline: Send + Sync {
    /// Short resource name for diagnostics
    fn name(&self) -> &'static str;

    fn acquire_reader(&self);

    fn release_reader(&self) -> Result<()>;

    fn acquire_writer(&self);

    fn release_writer(&self) -> Result<()>;

    /// Current counters
    fn snapshot(&self) -> DisciplineSnapshot;

    /// Acquire as a reader, releasing when the guard drops
    fn read(&self) -> ReadGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire_reader();
        ReadGuard { lock: self }
    }

    /// Acquire as a writer, releasing when the guard drops
    fn write(&self) -> WriteGuard<'_, Self>
    where
        Self: Sized,
    {
        self.acquire_writer();
        WriteGuard { lock: self }
    }
}

/// Point-in-time counters of one discipline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DisciplineSnapshot {
    /// Readers admitted (or being admitted)
    pub readers: usize,

    /// Writers waiting or active
    pub writers: usize,

    /// Readers blocked at the writer-preference gate
    pub readers_blocked: usize,

    /// Threads blocked on the resource itself
    pub writers_blocked: usize,

    /// Whether nobody currently holds the resource
    pub resource_free: bool,
}

/// Reader access to a discipline; released on drop
#[must_use = "the reader is released as soon as the guard is dropped"]
pub struct ReadGuard<'a, D: Discipline> {
    lock: &'a D,
}

impl<D: Discipline> Drop for ReadGuard<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_reader() {
            tracing::error!("{}", e);
        }
    }
}

/// Writer access to a discipline; released on drop
#[must_use = "the writer is released as soon as the guard is dropped"]
pub struct WriteGuard<'a, D: Discipline> {
    lock: &'a D,
}

impl<D: Discipline> Drop for WriteGuard<'_, D> {
    fn drop(&mut self) {
        if let Err(e) = self.lock.release_writer() {
            tracing::error!("{}", e);
        }
    }
}
