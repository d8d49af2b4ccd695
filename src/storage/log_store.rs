//! Log Store
//!
//! Append-only, newline-terminated audit lines.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::error::{Result, StoreError};

use super::positional::PositionalReader;

/// Append-only audit log file
///
/// Lines are addressed only by their position; nothing is ever overwritten.
///
/// ## Concurrency:
/// Callers bracket every call with the log discipline of the
/// [`Monitor`](crate::sync::Monitor): reads as a reader, `append_line` as a
/// writer.
pub struct LogStore {
    path: PathBuf,
    file: File,
}

impl LogStore {
    /// Open the log in append mode, creating it if missing
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)
            .map_err(|source| StoreError::ResourceOpen {
                kind: "log",
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Number of lines, counted by scanning to end of file
    ///
    /// A final line without a trailing newline still counts.
    pub fn count(&self) -> Result<usize> {
        let mut reader = BufReader::new(PositionalReader::new(&self.file, 0));
        let mut line = Vec::new();
        let mut lines = 0;

        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            lines += 1;
        }

        Ok(lines)
    }

    /// Append one line at end of file
    ///
    /// Embedded line breaks are flattened so one call is always one line.
    pub fn append_line(&self, text: &str) -> Result<()> {
        let mut line = text.replace(['\r', '\n'], " ");
        line.push('\n');

        // One write per line keeps concurrent appends from interleaving
        let mut file = &self.file;
        file.write_all(line.as_bytes())?;
        file.flush()?;
        Ok(())
    }

    /// The `n`th line (1-based), scanning from the beginning
    pub fn read_sequential(&self, n: usize) -> Result<Option<String>> {
        if n == 0 {
            return Ok(None);
        }

        let mut offset = 0;
        for _ in 1..n {
            match self.read_at(offset)? {
                Some((_, next)) => offset = next,
                None => return Ok(None),
            }
        }

        Ok(self.read_at(offset)?.map(|(line, _)| line))
    }

    /// The line starting at byte `offset` and the offset of the line after it
    ///
    /// Returns `None` at end of file.
    pub fn read_at(&self, offset: u64) -> Result<Option<(String, u64)>> {
        let mut reader = BufReader::new(PositionalReader::new(&self.file, offset));
        let mut line = Vec::new();

        let n = reader.read_until(b'\n', &mut line)?;
        if n == 0 {
            return Ok(None);
        }

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        Ok(Some((String::from_utf8_lossy(&line).into_owned(), offset + n as u64)))
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
