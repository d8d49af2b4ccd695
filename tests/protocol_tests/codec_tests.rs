//! Codec Tests
//!
//! Tests for fixed-size frame encoding/decoding.

use std::io::Cursor;

use recstore::protocol::{
    decode_packet, encode_packet, read_packet, truncate_text, write_packet, CommandCode, Packet,
    HEADER_SIZE, MAX_TEXT_LEN, PACKET_SIZE,
};
use recstore::StoreError;

// =============================================================================
// Helper Functions
// =============================================================================

fn sample_packet() -> Packet {
    Packet::new(4242, CommandCode::Fix, 3, "Jan '21,18.00,10.00,3.00,5.00")
}

// =============================================================================
// Frame Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_frame_is_fixed_size() {
    let empty = encode_packet(&Packet::new(1, CommandCode::Cnt, 0, "")).unwrap();
    let full = encode_packet(&Packet::new(1, CommandCode::Log, 0, "x".repeat(MAX_TEXT_LEN)))
        .unwrap();

    assert_eq!(empty.len(), PACKET_SIZE);
    assert_eq!(full.len(), PACKET_SIZE);
}

#[test]
fn test_encode_decode_packet() {
    let packet = sample_packet();

    let frame = encode_packet(&packet).unwrap();
    let decoded = decode_packet(&frame).unwrap();

    assert_eq!(decoded, packet);
    assert_eq!(decoded.code().unwrap(), CommandCode::Fix);
}

#[test]
fn test_frame_header_layout() {
    let frame = encode_packet(&sample_packet()).unwrap();

    let body_len = u16::from_be_bytes([frame[0], frame[1]]) as usize;
    let crc = u32::from_be_bytes([frame[2], frame[3], frame[4], frame[5]]);
    let body = &frame[HEADER_SIZE..HEADER_SIZE + body_len];

    assert_eq!(crc, crc32fast::hash(body));
    assert!(frame[HEADER_SIZE + body_len..].iter().all(|&b| b == 0));
}

#[test]
fn test_encode_rejects_long_text() {
    let packet = Packet::new(1, CommandCode::Get, 0, "x".repeat(MAX_TEXT_LEN + 1));

    assert!(matches!(encode_packet(&packet), Err(StoreError::Protocol(_))));
}

// =============================================================================
// Corruption Tests
// =============================================================================

#[test]
fn test_decode_detects_crc_mismatch() {
    let mut frame = encode_packet(&sample_packet()).unwrap().to_vec();
    frame[HEADER_SIZE + 2] ^= 0xFF;

    let result = decode_packet(&frame);

    match result {
        Err(StoreError::Protocol(msg)) => assert!(msg.contains("checksum")),
        other => panic!("expected checksum error, got {:?}", other),
    }
}

#[test]
fn test_decode_rejects_short_frame() {
    let frame = encode_packet(&sample_packet()).unwrap();

    let result = decode_packet(&frame[..PACKET_SIZE - 1]);

    assert!(matches!(result, Err(StoreError::Protocol(_))));
}

#[test]
fn test_decode_rejects_oversized_length() {
    let mut frame = encode_packet(&sample_packet()).unwrap().to_vec();
    frame[0] = 0xFF;
    frame[1] = 0xFF;

    assert!(matches!(decode_packet(&frame), Err(StoreError::Protocol(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_write_read_stream() {
    let mut buffer = Vec::new();
    write_packet(&mut buffer, &sample_packet()).unwrap();
    write_packet(&mut buffer, &Packet::new(7, CommandCode::Cnt, 0, "")).unwrap();

    assert_eq!(buffer.len(), 2 * PACKET_SIZE);

    let mut cursor = Cursor::new(buffer);
    assert_eq!(read_packet(&mut cursor).unwrap(), sample_packet());
    assert_eq!(read_packet(&mut cursor).unwrap().sender, 7);

    let eof = read_packet(&mut cursor).unwrap_err();
    assert!(eof.is_disconnect());
}

#[test]
fn test_truncated_stream_is_disconnect() {
    let frame = encode_packet(&sample_packet()).unwrap();
    let mut cursor = Cursor::new(frame[..50].to_vec());

    let err = read_packet(&mut cursor).unwrap_err();

    assert!(err.is_disconnect());
}

// =============================================================================
// Text Truncation Tests
// =============================================================================

#[test]
fn test_truncate_text_short_unchanged() {
    assert_eq!(truncate_text("hello"), "hello");
}

#[test]
fn test_truncate_text_limits_length() {
    let long = "y".repeat(MAX_TEXT_LEN + 20);

    assert_eq!(truncate_text(&long).len(), MAX_TEXT_LEN);
}

#[test]
fn test_truncate_text_respects_char_boundary() {
    // 'é' is two bytes, so byte MAX_TEXT_LEN falls mid-character
    let text = format!("{}é", "a".repeat(MAX_TEXT_LEN - 1));

    let cut = truncate_text(&text);

    assert_eq!(cut.len(), MAX_TEXT_LEN - 1);
    assert!(cut.chars().all(|c| c == 'a'));
}
