//! Command definitions
//!
//! Represents requests from clients.

use std::fmt;

use crate::error::{Result, StoreError};

use super::Packet;

/// Wire value of `GET` meaning "every record"
pub const ALL_RECORDS: i32 = -999;

/// Command symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCode {
    /// Record count
    Cnt,
    /// One record, or all of them
    Get,
    /// Update an existing record
    Fix,
    /// Append a new record
    New,
    /// Dump the audit log
    Log,
}

impl CommandCode {
    pub const ALL: [CommandCode; 5] = [
        CommandCode::Cnt,
        CommandCode::Get,
        CommandCode::Fix,
        CommandCode::New,
        CommandCode::Log,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CommandCode::Cnt => "CNT",
            CommandCode::Get => "GET",
            CommandCode::Fix => "FIX",
            CommandCode::New => "NEW",
            CommandCode::Log => "LOG",
        }
    }

    pub fn as_bytes(&self) -> [u8; 3] {
        let mut bytes = [0u8; 3];
        bytes.copy_from_slice(self.as_str().as_bytes());
        bytes
    }
}

impl TryFrom<[u8; 3]> for CommandCode {
    type Error = StoreError;

    fn try_from(bytes: [u8; 3]) -> Result<Self> {
        CommandCode::ALL
            .into_iter()
            .find(|code| code.as_bytes() == bytes)
            .ok_or_else(|| {
                StoreError::Protocol(format!(
                    "Unknown command: {:?}",
                    String::from_utf8_lossy(&bytes)
                ))
            })
    }
}

impl fmt::Display for CommandCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which records a `GET` asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    /// The record at this 1-based index
    One(u32),
    /// Every record, each in its own response packet
    All,
}

impl Selector {
    /// Wire value, or an error for an index the packet cannot carry
    pub fn to_wire(self) -> Result<i32> {
        match self {
            Selector::One(index) => wire_index(CommandCode::Get, index),
            Selector::All => Ok(ALL_RECORDS),
        }
    }

    pub fn from_wire(value: i32) -> Result<Self> {
        match value {
            ALL_RECORDS => Ok(Selector::All),
            v if v > 0 => Ok(Selector::One(v as u32)),
            v => Err(StoreError::Protocol(format!("GET: invalid record index {}", v))),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// How many records are stored
    Count,

    /// Fetch one record or all of them
    Get(Selector),

    /// Replace the record at `index` with encoded `record` text
    Fix { index: u32, record: String },

    /// Append encoded `record` text
    New { record: String },

    /// Fetch the audit log
    Log,

    /// A `GET` or `FIX` naming an index no slot can have
    ///
    /// Still answered: `GET` with an empty record, `FIX` with a failure ack.
    OutOfRange { code: CommandCode, index: i32 },
}

impl Command {
    /// Get the command symbol
    pub fn code(&self) -> CommandCode {
        match self {
            Command::Count => CommandCode::Cnt,
            Command::Get(_) => CommandCode::Get,
            Command::Fix { .. } => CommandCode::Fix,
            Command::New { .. } => CommandCode::New,
            Command::Log => CommandCode::Log,
            Command::OutOfRange { code, .. } => *code,
        }
    }
}

/// A command together with the identity of the client that sent it
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub sender: u32,
    pub command: Command,
}

impl Request {
    pub fn new(sender: u32, command: Command) -> Self {
        Self { sender, command }
    }

    /// Build the request packet
    ///
    /// Fails when a record index does not fit the packet's signed value.
    pub fn to_packet(&self) -> Result<Packet> {
        let sender = self.sender;
        let packet = match &self.command {
            Command::Count => Packet::new(sender, CommandCode::Cnt, 0, ""),
            Command::Get(selector) => {
                Packet::new(sender, CommandCode::Get, selector.to_wire()?, "")
            }
            Command::Fix { index, record } => Packet::new(
                sender,
                CommandCode::Fix,
                wire_index(CommandCode::Fix, *index)?,
                record.as_str(),
            ),
            Command::New { record } => Packet::new(sender, CommandCode::New, -1, record.as_str()),
            Command::Log => Packet::new(sender, CommandCode::Log, 0, ""),
            Command::OutOfRange { code, index } => Packet::new(sender, *code, *index, ""),
        };
        Ok(packet)
    }

    pub fn from_packet(packet: Packet) -> Result<Self> {
        let command = match packet.code()? {
            CommandCode::Cnt => Command::Count,
            CommandCode::Get => match Selector::from_wire(packet.value) {
                Ok(selector) => Command::Get(selector),
                Err(_) => Command::OutOfRange {
                    code: CommandCode::Get,
                    index: packet.value,
                },
            },
            CommandCode::Fix => match u32::try_from(packet.value) {
                Ok(index) if index > 0 => Command::Fix {
                    index,
                    record: packet.text,
                },
                _ => Command::OutOfRange {
                    code: CommandCode::Fix,
                    index: packet.value,
                },
            },
            CommandCode::New => Command::New {
                record: packet.text,
            },
            CommandCode::Log => Command::Log,
        };

        Ok(Self {
            sender: packet.sender,
            command,
        })
    }
}

fn wire_index(code: CommandCode, index: u32) -> Result<i32> {
    i32::try_from(index).map_err(|_| {
        StoreError::Protocol(format!("{}: record index {} out of range", code, index))
    })
}
