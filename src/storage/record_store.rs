//! Record Store
//!
//! Flat file of fixed-width slots, one encoded record per slot.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};
use crate::record::{encode_slot, DataRecord, SLOT_WIDTH};

use super::positional::{read_full_at, write_full_at};

/// Fixed-slot record file
///
/// Slot `i` (1-based) lives at byte offset `(i - 1) * SLOT_WIDTH`.
///
/// ## Concurrency:
/// No locking happens here. Every call must be bracketed by the record
/// discipline of the [`Monitor`](crate::sync::Monitor): `count`/`read` as a
/// reader, `write`/`append` as a writer.
pub struct RecordStore {
    path: PathBuf,
    file: File,
}

impl RecordStore {
    /// Open the record file, creating an empty store if it does not exist
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .map_err(|source| StoreError::ResourceOpen {
                kind: "data",
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Number of occupied slots
    ///
    /// Scans the whole file; never cached, so it always reflects the file.
    pub fn count(&self) -> Result<u32> {
        let mut slot = [0u8; SLOT_WIDTH];
        let mut offset = 0u64;
        let mut occupied = 0u32;

        loop {
            let n = read_full_at(&self.file, &mut slot, offset)?;
            if n == 0 {
                break;
            }
            if slot[0] != 0 {
                occupied += 1;
            }
            offset += n as u64;
        }

        Ok(occupied)
    }

    /// Raw text stored in slot `index`, without NUL padding
    ///
    /// A slot past the end of the file reads as empty text.
    pub fn read_text(&self, index: u32) -> Result<String> {
        let offset = Self::slot_offset(index)?;

        let mut slot = [0u8; SLOT_WIDTH];
        let n = read_full_at(&self.file, &mut slot, offset)?;

        let end = slot[..n].iter().position(|&b| b == 0).unwrap_or(n);
        Ok(String::from_utf8_lossy(&slot[..end]).into_owned())
    }

    /// Decode the record in slot `index`
    ///
    /// No bounds check: an index outside `1..=count()` fails to decode.
    pub fn read(&self, index: u32) -> Result<DataRecord> {
        let text = self.read_text(index)?;
        DataRecord::from_store_text(&text, Some(index))
    }

    /// Overwrite slot `index` with `record`
    ///
    /// `index` may name an existing slot or the one just past the end.
    /// Returns `Ok(false)` when nothing was written (index out of range or the
    /// OS accepted zero bytes).
    pub fn write(&self, index: u32, record: &DataRecord) -> Result<bool> {
        let slot = encode_slot(record)?;

        let slots = self.file.metadata()?.len().div_ceil(SLOT_WIDTH as u64);
        if index == 0 || u64::from(index) > slots + 1 {
            tracing::debug!(index, slots, "record write outside store");
            return Ok(false);
        }

        let written = write_full_at(&self.file, &slot, Self::slot_offset(index)?)?;
        Ok(written != 0)
    }

    /// Write `record` into the slot after the last occupied one
    pub fn append(&self, record: &DataRecord) -> Result<bool> {
        let count = self.count()?;
        self.write(count + 1, record)
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of slot `index`
    fn slot_offset(index: u32) -> Result<u64> {
        let slot = index
            .checked_sub(1)
            .ok_or_else(|| StoreError::Codec("record index 0 is not a slot".to_string()))?;
        Ok(u64::from(slot) * SLOT_WIDTH as u64)
    }
}
