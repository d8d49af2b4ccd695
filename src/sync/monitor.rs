//! Monitor
//!
//! The shared synchronization object for the record store and the log.

use std::fmt;

use super::{Discipline, DisciplineSnapshot, LogLock, RecordLock};

/// Synchronizes every handler's access to the record store and the audit log
///
/// Created once at server startup and shared by reference (`Arc<Engine>`)
/// with every connection handler. The two disciplines are independent: a
/// handler never holds both at once.
pub struct Monitor {
    /// Identity of this monitor (defaults to the listening port)
    key: u32,

    records: RecordLock,

    log: LogLock,
}

impl Monitor {
    /// Create a monitor with both resources free
    pub fn new(key: u32) -> Self {
        tracing::debug!(key, "monitor created");
        Self {
            key,
            records: RecordLock::new(),
            log: LogLock::new(),
        }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    /// Discipline guarding the record store
    pub fn records(&self) -> &RecordLock {
        &self.records
    }

    /// Discipline guarding the audit log
    pub fn log(&self) -> &LogLock {
        &self.log
    }

    /// Counters of both disciplines
    pub fn snapshot(&self) -> MonitorSnapshot {
        MonitorSnapshot {
            key: self.key,
            records: self.records.snapshot(),
            log: self.log.snapshot(),
        }
    }
}

impl fmt::Debug for Monitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Monitor")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}

/// Counters of a [`Monitor`] at one instant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSnapshot {
    pub key: u32,
    pub records: DisciplineSnapshot,
    pub log: DisciplineSnapshot,
}

impl MonitorSnapshot {
    /// True when no reader or writer holds or awaits either resource
    pub fn is_idle(&self) -> bool {
        let idle = |s: &DisciplineSnapshot| {
            s.readers == 0
                && s.writers == 0
                && s.readers_blocked == 0
                && s.writers_blocked == 0
                && s.resource_free
        };
        idle(&self.records) && idle(&self.log)
    }
}

impl fmt::Display for MonitorSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line = |f: &mut fmt::Formatter<'_>, name: &str, s: &DisciplineSnapshot| {
            write!(
                f,
                "{}: readers={} writers={} readers_blocked={} writers_blocked={} free={}",
                name, s.readers, s.writers, s.readers_blocked, s.writers_blocked, s.resource_free
            )
        };
        write!(f, "monitor {} | ", self.key)?;
        line(f, "records", &self.records)?;
        write!(f, " | ")?;
        line(f, "log", &self.log)
    }
}
