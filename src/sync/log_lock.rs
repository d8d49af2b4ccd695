//! Log store discipline
//!
//! Weak reader preference with concurrent readers.
//!
//! The first reader in takes the single `resource` permit on behalf of the
//! whole reader group and the last reader out returns it. Writers take the
//! same permit directly. There is no writer-waiting barrier, so a steady
//! stream of readers can keep a writer waiting.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{Result, StoreError};

use super::{Discipline, DisciplineSnapshot, Semaphore};

/// Weak-reader-preference readers-writers lock for the audit log
pub struct LogLock {
    /// Serializes updates of `readers`
    reader_count_mutex: Mutex<()>,

    /// The log's single mutex: held by a writer or by the reader group
    resource: Semaphore,

    /// Readers in (or entering) the critical section
    readers: AtomicUsize,

    /// Set while a writer holds `resource`
    writer_active: AtomicBool,

    /// Times the reader group took `resource` (0→1 reader transitions)
    group_acquisitions: AtomicU64,
}

impl LogLock {
    pub fn new() -> Self {
        Self {
            reader_count_mutex: Mutex::new(()),
            resource: Semaphore::new("log.resource", 1),
            readers: AtomicUsize::new(0),
            writer_active: AtomicBool::new(false),
            group_acquisitions: AtomicU64::new(0),
        }
    }

    /// Number of times a reader group has taken the log mutex
    pub fn group_acquisitions(&self) -> u64 {
        self.group_acquisitions.load(Ordering::SeqCst)
    }
}

impl Default for LogLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Discipline for LogLock {
    fn name(&self) -> &'static str {
        "log"
    }

    fn acquire_reader(&self) {
        let _count = self.reader_count_mutex.lock();

        let readers = self.readers.fetch_add(1, Ordering::SeqCst) + 1;
        if readers == 1 {
            self.resource.wait();
            self.group_acquisitions.fetch_add(1, Ordering::SeqCst);
            tracing::trace!("log: readers gained access");
        }
    }

    fn release_reader(&self) -> Result<()> {
        let _count = self.reader_count_mutex.lock();

        let readers = self.readers.load(Ordering::SeqCst);
        if readers == 0 {
            return Err(StoreError::Sync(
                "log: release_reader without an active reader".to_string(),
            ));
        }
        self.readers.store(readers - 1, Ordering::SeqCst);

        if readers == 1 {
            self.resource.signal();
        }
        Ok(())
    }

    fn acquire_writer(&self) {
        self.resource.wait();
        self.writer_active.store(true, Ordering::SeqCst);
    }

    fn release_writer(&self) -> Result<()> {
        // Only the writer that set the flag may clear it
        if self
            .writer_active
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(StoreError::Sync(
                "log: release_writer without an active writer".to_string(),
            ));
        }
        self.resource.signal();
        Ok(())
    }

    fn snapshot(&self) -> DisciplineSnapshot {
        let resource_free = self.resource.value() > 0;
        let readers = self.readers.load(Ordering::SeqCst);
        DisciplineSnapshot {
            readers,
            writers: usize::from(self.writer_active.load(Ordering::SeqCst)),
            readers_blocked: 0,
            writers_blocked: self.resource.waiters(),
            resource_free,
        }
    }
}
