//! Audit trail entries
//!
//! The sentences appended to the log store after each completed command.

use std::fmt;

/// One auditable server operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// A client connected from `addr`
    Connected { addr: String },

    /// `CNT` answered with `count`
    Counted { client: u32, count: u32 },

    /// `GET i` answered with record `index`
    SentRecord { client: u32, index: i64 },

    /// `GET -999` answered with `count` records
    SentAllRecords { client: u32, count: u32 },

    /// `FIX` processed for record `index`
    Updated { client: u32, index: i64 },

    /// `NEW` processed
    Added { client: u32 },

    /// `LOG` answered with `count` log lines
    SentLog { client: u32, count: usize },
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::Connected { addr } => write!(f, "{} successfully connected.", addr),
            AuditEvent::Counted { client, count } => write!(
                f,
                "Server responded to Client {} with {} total records.",
                client, count
            ),
            AuditEvent::SentRecord { client, index } => write!(
                f,
                "Server responded to Client {} with record #{}.",
                client, index
            ),
            AuditEvent::SentAllRecords { client, count } => write!(
                f,
                "Server responded to Client {} with list of {} records.",
                client, count
            ),
            AuditEvent::Updated { client, index } => write!(
                f,
                "Server successfully updated record #{} for Client {}.",
                index, client
            ),
            AuditEvent::Added { client } => write!(
                f,
                "Server successfully added record provided by Client {}.",
                client
            ),
            AuditEvent::SentLog { client, count } => write!(
                f,
                "Server responded to Client {} with list of {} log records.",
                client, count
            ),
        }
    }
}
