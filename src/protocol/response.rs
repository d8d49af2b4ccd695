//! Response definitions
//!
//! Represents responses to clients.

use crate::error::{Result, StoreError};

use super::{CommandCode, Packet};

/// Acknowledgment text for an applied FIX/NEW
pub const SUCCESS: &str = "SUCCESS";

/// Acknowledgment text for a FIX/NEW that wrote nothing
pub const FAILURE: &str = "FAILURE";

/// Shapes a response packet can take
///
/// The wire does not tag them; the client knows which one it is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Count,
    Record,
    Ack(CommandCode),
    LogCount,
    LogLine,
}

/// A response to send to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `CNT`: number of records
    Count(u32),

    /// `GET`: one record's store text
    Record(String),

    /// `FIX` / `NEW`: whether the write happened (`index` is -1 for `NEW`)
    Ack {
        command: CommandCode,
        index: i32,
        success: bool,
    },

    /// `LOG`: number of log lines that follow
    LogCount(usize),

    /// `LOG`: one log line
    LogLine(String),
}

impl Response {
    /// Wrap this response in a packet from `sender`
    pub fn to_packet(&self, sender: u32) -> Packet {
        match self {
            Response::Count(n) => Packet::new(sender, CommandCode::Cnt, saturate(*n as u64), ""),
            Response::Record(text) => Packet::new(sender, CommandCode::Get, 0, text.as_str()),
            Response::Ack {
                command,
                index,
                success,
            } => Packet::new(
                sender,
                *command,
                *index,
                if *success { SUCCESS } else { FAILURE },
            ),
            Response::LogCount(n) => {
                Packet::new(sender, CommandCode::Log, saturate(*n as u64), "")
            }
            Response::LogLine(line) => Packet::new(sender, CommandCode::Log, 0, line.as_str()),
        }
    }

    /// Interpret a packet as the response shape the caller is waiting for
    pub fn from_packet(packet: Packet, kind: ResponseKind) -> Result<Self> {
        match kind {
            ResponseKind::Count => {
                packet.expect_code(CommandCode::Cnt)?;
                Ok(Response::Count(non_negative(packet.value, "CNT")?))
            }
            ResponseKind::Record => {
                packet.expect_code(CommandCode::Get)?;
                Ok(Response::Record(packet.text))
            }
            ResponseKind::Ack(command) => {
                packet.expect_code(command)?;
                let success = match packet.text.as_str() {
                    SUCCESS => true,
                    FAILURE => false,
                    other => {
                        return Err(StoreError::Protocol(format!(
                            "{}: unexpected acknowledgment {:?}",
                            command, other
                        )))
                    }
                };
                Ok(Response::Ack {
                    command,
                    index: packet.value,
                    success,
                })
            }
            ResponseKind::LogCount => {
                packet.expect_code(CommandCode::Log)?;
                Ok(Response::LogCount(non_negative(packet.value, "LOG")? as usize))
            }
            ResponseKind::LogLine => {
                packet.expect_code(CommandCode::Log)?;
                Ok(Response::LogLine(packet.text))
            }
        }
    }
}

fn saturate(n: u64) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

fn non_negative(value: i32, what: &str) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| StoreError::Protocol(format!("{}: negative count {}", what, value)))
}
