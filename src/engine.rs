//! Engine Module
//!
//! The shared context every connection handler works against.
//!
//! ## Responsibilities
//! - Own the record store, the audit log and the monitor
//! - Bracket every store access with the matching monitor discipline
//! - Turn rejected record payloads into a plain `false`

use std::fs;
use std::path::Path;

use crate::audit::AuditEvent;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::record::DataRecord;
use crate::storage::{LogStore, RecordStore};
use crate::sync::{Discipline, Monitor};

/// Stores plus the monitor that serializes access to them
///
/// ## Concurrency Model
///
/// - **Record store**: strong writer preference. `record_count`,
///   `record_text` and `get_record` run as readers and may overlap;
///   `update_record` and `add_record` run as the single writer.
///
/// - **Audit log**: weak reader preference. `log_count` and `log_line*` run
///   as readers; `audit` runs as a writer.
///
/// No method holds both disciplines at once. A command's data change and
/// its audit line are two separate critical sections, so a crash between
/// them loses the audit line but never the data change.
pub struct Engine {
    config: Config,

    monitor: Monitor,

    records: RecordStore,

    log: LogStore,
}

impl Engine {
    /// Open both files and create the monitor
    ///
    /// On startup:
    /// 1. Validate the config
    /// 2. Create the data directory if needed
    /// 3. Open (or create) the record store and the log
    /// 4. Create the monitor keyed by `config.monitor_key()`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.data_dir).map_err(|source| StoreError::ResourceOpen {
            kind: "data directory",
            path: config.data_dir.clone(),
            source,
        })?;

        let records = RecordStore::open(&config.records_path())?;
        let log = LogStore::open(&config.log_path())?;
        let monitor = Monitor::new(config.monitor_key());

        tracing::info!(
            records = %records.path().display(),
            log = %log.path().display(),
            key = monitor.key(),
            "engine opened"
        );

        Ok(Self {
            config,
            monitor,
            records,
            log,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        let config = Config::builder().data_dir(path).build();
        Self::open(config)
    }

    // =========================================================================
    // Record Store (strong writer preference)
    // =========================================================================

    /// Number of stored records
    pub fn record_count(&self) -> Result<u32> {
        let _reader = self.monitor.records().read();
        self.records.count()
    }

    /// Raw store text of record `index` (empty past the end of the store)
    pub fn record_text(&self, index: u32) -> Result<String> {
        let _reader = self.monitor.records().read();
        self.records.read_text(index)
    }

    /// Decoded record `index`
    pub fn get_record(&self, index: u32) -> Result<DataRecord> {
        let _reader = self.monitor.records().read();
        self.records.read(index)
    }

    /// Overwrite record `index`
    pub fn update_record(&self, index: u32, record: &DataRecord) -> Result<bool> {
        let _writer = self.monitor.records().write();
        self.records.write(index, record)
    }

    /// Append a record after the last one
    ///
    /// The slot is chosen and written inside one writer critical section, so
    /// concurrent appends never pick the same slot.
    pub fn add_record(&self, record: &DataRecord) -> Result<bool> {
        let _writer = self.monitor.records().write();
        self.records.append(record)
    }

    /// Apply a `FIX` payload: decode `text` and overwrite record `index`
    ///
    /// A payload that does not decode or re-encode is a failed write.
    pub fn apply_fix(&self, index: u32, text: &str) -> Result<bool> {
        let record = match DataRecord::from_store_text(text, Some(index)) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(index, "rejected FIX payload: {}", e);
                return Ok(false);
            }
        };
        rejected_as_false(self.update_record(index, &record))
    }

    /// Apply a `NEW` payload: decode `text` and append it
    pub fn apply_new(&self, text: &str) -> Result<bool> {
        let record = match DataRecord::from_store_text(text, None) {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!("rejected NEW payload: {}", e);
                return Ok(false);
            }
        };
        rejected_as_false(self.add_record(&record))
    }

    // =========================================================================
    // Audit Log (weak reader preference)
    // =========================================================================

    /// Number of audit lines
    pub fn log_count(&self) -> Result<usize> {
        let _reader = self.monitor.log().read();
        self.log.count()
    }

    /// Audit line `n` (1-based)
    pub fn log_line(&self, n: usize) -> Result<Option<String>> {
        let _reader = self.monitor.log().read();
        self.log.read_sequential(n)
    }

    /// Audit line starting at byte `offset`, with the offset of the next one
    pub fn log_line_at(&self, offset: u64) -> Result<Option<(String, u64)>> {
        let _reader = self.monitor.log().read();
        self.log.read_at(offset)
    }

    /// Append one audit line
    pub fn audit(&self, event: &AuditEvent) -> Result<()> {
        let line = event.to_string();
        let _writer = self.monitor.log().write();
        self.log.append_line(&line)
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn monitor(&self) -> &Monitor {
        &self.monitor
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn records_path(&self) -> &Path {
        self.records.path()
    }

    pub fn log_path(&self) -> &Path {
        self.log.path()
    }
}

/// Map record-shaped failures to `Ok(false)`, keep I/O failures as errors
fn rejected_as_false(result: Result<bool>) -> Result<bool> {
    match result {
        Err(StoreError::Codec(msg)) => {
            tracing::debug!("record rejected: {}", msg);
            Ok(false)
        }
        Err(e @ StoreError::RecordTooLong { .. }) => {
            tracing::debug!("record rejected: {}", e);
            Ok(false)
        }
        other => other,
    }
}
