//! Storage Module
//!
//! The two shared files.
//!
//! ## Responsibilities
//! - Record store: fixed-width slots, random access by 1-based index
//! - Log store: append-only lines, sequential access only
//!
//! Neither store synchronizes; the monitor does.
//!
//! ## Record File Format
//! ```text
//! ┌────────────────────────────┐  offset 0
//! │ slot 1: text + NUL padding │
//! ├────────────────────────────┤  offset SLOT_WIDTH
//! │ slot 2                     │
//! ├────────────────────────────┤
//! │ ...                        │
//! └────────────────────────────┘
//! ```

mod positional;
mod record_store;
mod log_store;

pub use record_store::RecordStore;
pub use log_store::LogStore;
