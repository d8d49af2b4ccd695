//! Packet definition
//!
//! The single envelope every request and response travels in.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};

use super::CommandCode;

/// One message on the wire
///
/// Every command uses the same envelope; which fields carry meaning depends
/// on the command and direction (see the module docs of [`crate::protocol`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Packet {
    /// Process id of the sender
    pub sender: u32,

    /// Three-letter command symbol, e.g. `b"CNT"`
    pub command: [u8; 3],

    /// Record index, count, or the all-records sentinel
    pub value: i32,

    /// Record text, log line, or `SUCCESS` / `FAILURE`
    pub text: String,
}

impl Packet {
    pub fn new(sender: u32, code: CommandCode, value: i32, text: impl Into<String>) -> Self {
        Self {
            sender,
            command: code.as_bytes(),
            value,
            text: text.into(),
        }
    }

    /// Decode the command symbol
    pub fn code(&self) -> Result<CommandCode> {
        CommandCode::try_from(self.command)
    }

    /// Fail unless this packet carries `expected`
    pub fn expect_code(&self, expected: CommandCode) -> Result<()> {
        let code = self.code()?;
        if code != expected {
            return Err(StoreError::Protocol(format!(
                "expected {} packet, got {}",
                expected, code
            )));
        }
        Ok(())
    }
}
