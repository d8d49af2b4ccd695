//! # recstore
//!
//! A multi-client record server with:
//! - A fixed-slot record store shared by every connection
//! - An append-only audit log of every served command
//! - Readers-writers concurrency control over both files
//! - TCP-based client protocol with fixed-size frames
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                              │
//! │            (one handler thread per client)                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                       Engine                                 │
//! │          (Monitor-bracketed store operations)                │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ RecordLock  │          │   LogLock   │
//!   │  (writers   │          │  (readers   │
//!   │  preferred) │          │  preferred) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          ▼                        ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ RecordStore │          │  LogStore   │
//!   │   (slots)   │          │  (append)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod record;
pub mod sync;
pub mod storage;
pub mod protocol;
pub mod audit;
pub mod engine;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use config::Config;
pub use engine::Engine;
pub use record::DataRecord;
pub use sync::{Discipline, Monitor};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of recstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
