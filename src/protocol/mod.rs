//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Exchange
//! One request packet, then the response packet(s) for it:
//!
//! | Request              | Response packets                                   |
//! |----------------------|----------------------------------------------------|
//! | `CNT`                | `CNT` value = record count                         |
//! | `GET` value = i      | `GET` text = record i                              |
//! | `GET` value = -999   | `count` × `GET` text = record, no terminator       |
//! | `FIX` value = i, text| `FIX` value = i, text = `SUCCESS` / `FAILURE`      |
//! | `NEW` text = record  | `NEW` value = -1, text = `SUCCESS` / `FAILURE`     |
//! | `LOG`                | `LOG` value = n, then n × `LOG` text = log line    |
//!
//! A client that asks for all records must already know how many to expect
//! (from a prior `CNT`); the list is not self-terminating.
//!
//! A `GET` or `FIX` whose index no slot can have (zero, or negative other
//! than -999) is still answered: an empty record, or a `FAILURE` ack.
//!
//! ## Frame
//! See [`encode_packet`] for the fixed-size frame layout.

mod packet;
mod command;
mod response;
mod codec;

pub use packet::Packet;
pub use command::{Command, CommandCode, Request, Selector, ALL_RECORDS};
pub use response::{Response, ResponseKind, FAILURE, SUCCESS};
pub use codec::{
    decode_packet, encode_packet, read_packet, truncate_text, write_packet, HEADER_SIZE,
    MAX_TEXT_LEN, PACKET_SIZE,
};
