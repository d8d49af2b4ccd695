//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every packet occupies exactly [`PACKET_SIZE`] bytes, so one read of a
//! known size always yields one packet:
//! ```text
//! ┌──────────┬──────────┬──────────────────────┬──────────────┐
//! │ Len (2)  │ CRC (4)  │ Body (bincode)       │ Zero padding │
//! └──────────┴──────────┴──────────────────────┴──────────────┘
//! ```
//! `Len` and `CRC` are big-endian; `CRC` is the CRC32 of the body.

use std::io::{Read, Write};

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{Result, StoreError};

use super::Packet;

/// Size of every frame on the wire
pub const PACKET_SIZE: usize = 128;

/// Header size: 2 bytes body length + 4 bytes CRC32
pub const HEADER_SIZE: usize = 6;

/// Longest `text` a packet may carry (bytes)
pub const MAX_TEXT_LEN: usize = 96;

/// Maximum body size after the header
const MAX_BODY_SIZE: usize = PACKET_SIZE - HEADER_SIZE;

// =============================================================================
// Packet Encoding/Decoding
// =============================================================================

/// Encode a packet into one fixed-size frame
pub fn encode_packet(packet: &Packet) -> Result<Bytes> {
    if packet.text.len() > MAX_TEXT_LEN {
        return Err(StoreError::Protocol(format!(
            "Packet text too long: {} bytes (max {})",
            packet.text.len(),
            MAX_TEXT_LEN
        )));
    }

    let body = bincode::serialize(packet)?;
    if body.len() > MAX_BODY_SIZE {
        return Err(StoreError::Protocol(format!(
            "Packet body too large: {} bytes (max {})",
            body.len(),
            MAX_BODY_SIZE
        )));
    }

    let mut frame = BytesMut::with_capacity(PACKET_SIZE);
    frame.put_u16(body.len() as u16);
    frame.put_u32(crc32fast::hash(&body));
    frame.put_slice(&body);
    frame.resize(PACKET_SIZE, 0);

    Ok(frame.freeze())
}

/// Decode one frame
pub fn decode_packet(bytes: &[u8]) -> Result<Packet> {
    if bytes.len() < PACKET_SIZE {
        return Err(StoreError::Protocol(format!(
            "Incomplete packet: expected {} bytes, got {}",
            PACKET_SIZE,
            bytes.len()
        )));
    }

    let body_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
    if body_len > MAX_BODY_SIZE {
        return Err(StoreError::Protocol(format!(
            "Packet body too large: {} bytes (max {})",
            body_len, MAX_BODY_SIZE
        )));
    }

    let expected_crc = u32::from_be_bytes([bytes[2], bytes[3], bytes[4], bytes[5]]);
    let body = &bytes[HEADER_SIZE..HEADER_SIZE + body_len];
    let actual_crc = crc32fast::hash(body);
    if actual_crc != expected_crc {
        return Err(StoreError::Protocol(format!(
            "Packet checksum mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    let packet: Packet = bincode::deserialize(body)?;
    if packet.text.len() > MAX_TEXT_LEN {
        return Err(StoreError::Protocol(format!(
            "Packet text too long: {} bytes (max {})",
            packet.text.len(),
            MAX_TEXT_LEN
        )));
    }

    Ok(packet)
}

/// Cut `text` to at most [`MAX_TEXT_LEN`] bytes on a char boundary
pub fn truncate_text(text: &str) -> &str {
    if text.len() <= MAX_TEXT_LEN {
        return text;
    }
    let mut end = MAX_TEXT_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read exactly one packet from a stream
///
/// Blocks until a full frame is received or an error occurs
pub fn read_packet<R: Read>(reader: &mut R) -> Result<Packet> {
    let mut frame = [0u8; PACKET_SIZE];
    reader.read_exact(&mut frame)?;
    decode_packet(&frame)
}

/// Write one packet to a stream and flush it
pub fn write_packet<W: Write>(writer: &mut W, packet: &Packet) -> Result<()> {
    let frame = encode_packet(packet)?;
    writer.write_all(&frame)?;
    writer.flush()?;
    Ok(())
}
