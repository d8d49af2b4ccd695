//! Record store discipline
//!
//! Strong writer preference with concurrent readers.
//!
//! ```text
//! reader:  gate.P ─ [count_mutex: readers++ ; first? turn.P] ─ gate.V ── read ── [count_mutex: readers-- ; last? turn.V]
//! writer:  [writer_mutex: writers++ ; first? gate.P] ─ turn.P ── write ── turn.V ─ [writer_mutex: writers-- ; last? gate.V]
//! ```
//!
//! The first waiting writer closes `reader_gate`, so no new reader is admitted
//! until the last writer leaves. `writer_turn` is held either by the whole
//! reader group or by exactly one writer.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::error::{Result, StoreError};

use super::{Discipline, DisciplineSnapshot, Semaphore};

/// Strong-writer-preference readers-writers lock for the record store
pub struct RecordLock {
    /// Serializes updates of `readers`
    reader_count_mutex: Mutex<()>,

    /// Serializes updates of `writers`
    writer_count_mutex: Mutex<()>,

    /// Closed while any writer is waiting or active
    reader_gate: Semaphore,

    /// Held by the active reader group or by the single active writer
    writer_turn: Semaphore,

    /// Readers admitted to the critical section
    readers: AtomicUsize,

    /// Writers waiting or active
    writers: AtomicUsize,
}

impl RecordLock {
    pub fn new() -> Self {
        Self {
            reader_count_mutex: Mutex::new(()),
            writer_count_mutex: Mutex::new(()),
            reader_gate: Semaphore::new("records.reader_gate", 1),
            writer_turn: Semaphore::new("records.writer_turn", 1),
            readers: AtomicUsize::new(0),
            writers: AtomicUsize::new(0),
        }
    }
}

impl Default for RecordLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Discipline for RecordLock {
    fn name(&self) -> &'static str {
        "records"
    }

    fn acquire_reader(&self) {
        if self.writers.load(Ordering::SeqCst) > 0 {
            tracing::trace!("records: reader waiting for writer(s) to complete");
        }
        self.reader_gate.wait();

        {
            let _count = self.reader_count_mutex.lock();
            let readers = self.readers.fetch_add(1, Ordering::SeqCst) + 1;
            if readers == 1 {
                self.writer_turn.wait();
            }
            tracing::trace!(readers, "records: reader added");
        }

        self.reader_gate.signal();
    }

    fn release_reader(&self) -> Result<()> {
        let _count = self.reader_count_mutex.lock();

        let readers = self.readers.load(Ordering::SeqCst);
        if readers == 0 {
            return Err(StoreError::Sync(
                "records: release_reader without an active reader".to_string(),
            ));
        }
        self.readers.store(readers - 1, Ordering::SeqCst);
        tracing::trace!(readers = readers - 1, "records: reader removed");

        if readers == 1 {
            self.writer_turn.signal();
        }
        Ok(())
    }

    fn acquire_writer(&self) {
        {
            let _count = self.writer_count_mutex.lock();
            let writers = self.writers.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::trace!(writers, "records: writer added");
            if writers == 1 {
                self.reader_gate.wait();
            }
        }

        if self.readers.load(Ordering::SeqCst) > 0 {
            tracing::trace!("records: writer waiting for current readers to finish");
        }
        self.writer_turn.wait();
    }

    fn release_writer(&self) -> Result<()> {
        let _count = self.writer_count_mutex.lock();

        let writers = self.writers.load(Ordering::SeqCst);
        if writers == 0 {
            return Err(StoreError::Sync(
                "records: release_writer without an active writer".to_string(),
            ));
        }

        self.writer_turn.signal();
        self.writers.store(writers - 1, Ordering::SeqCst);
        tracing::trace!(writers = writers - 1, "records: writer removed");

        if writers == 1 {
            self.reader_gate.signal();
        }
        Ok(())
    }

    fn snapshot(&self) -> DisciplineSnapshot {
        DisciplineSnapshot {
            readers: self.readers.load(Ordering::SeqCst),
            writers: self.writers.load(Ordering::SeqCst),
            readers_blocked: self.reader_gate.waiters(),
            writers_blocked: self.writer_turn.waiters(),
            resource_free: self.writer_turn.value() > 0,
        }
    }
}
