//! Tests for Server and Connection
//!
//! These tests verify:
//! - Accept loop startup and shutdown
//! - Audit lines written by the handler
//! - Bad frames are skipped without dropping the connection
//! - Out-of-range indexes are still answered
//! - Connection cap
//! - One handler's failure leaves others untouched

use std::io::Write;
use std::net::TcpStream;

use recstore::network::Client;
use recstore::protocol::{
    read_packet, write_packet, Command, CommandCode, Packet, Request, Response, ResponseKind,
    Selector, PACKET_SIZE,
};
use recstore::DataRecord;

use crate::helpers::{wait_until, TestServer};

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_server_binds_ephemeral_port() {
    let server = TestServer::start();

    assert_ne!(server.addr.port(), 0);
}

#[test]
fn test_server_shutdown_stops_accept_loop() {
    let mut server = TestServer::start();

    server.stop().unwrap();
}

#[test]
fn test_shutdown_handle_from_other_thread() {
    let mut server = TestServer::start();
    let handle = server.server.shutdown_handle();

    std::thread::spawn(move || handle.shutdown()).join().unwrap();

    server.stop().unwrap();
}

#[test]
fn test_bind_conflict_is_network_error() {
    let server = TestServer::start();
    let config = recstore::Config::builder()
        .data_dir(server.engine.config().data_dir.clone())
        .listen_addr(server.addr.to_string())
        .build();

    let result = recstore::network::Server::bind(config, server.engine.clone());

    assert!(matches!(result, Err(recstore::StoreError::Network(_))));
}

// =============================================================================
// Audit Tests
// =============================================================================

#[test]
fn test_connect_is_audited() {
    let server = TestServer::start();

    let mut client = Client::with_id(server.addr, 11).unwrap();
    let lines = client.server_log().unwrap();

    assert_eq!(lines.len(), 1);
    assert!(lines[0].ends_with(" successfully connected."));
    assert!(lines[0].starts_with("127.0.0.1:"));
}

#[test]
fn test_each_command_appends_one_line_after_response() {
    let server = TestServer::start();
    let mut client = Client::with_id(server.addr, 31).unwrap();

    client
        .add(&DataRecord::with_computed_total("Jan '21", 5.0, 10.0, 3.0))
        .unwrap();
    client.count().unwrap();
    client.get(1).unwrap();
    client.get_all().unwrap();

    let lines = client.server_log().unwrap();

    // get_all issues CNT then GET -999
    assert_eq!(
        &lines[1..],
        &[
            "Server successfully added record provided by Client 31.",
            "Server responded to Client 31 with 1 total records.",
            "Server responded to Client 31 with record #1.",
            "Server responded to Client 31 with 1 total records.",
            "Server responded to Client 31 with list of 1 records.",
        ]
    );

    // The LOG itself is audited once its response is out
    let lines = client.server_log().unwrap();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Server responded to Client 31 with list of 6 log records.")
    );
}

#[test]
fn test_failed_write_is_still_audited() {
    let server = TestServer::start();
    let mut client = Client::with_id(server.addr, 8).unwrap();

    let mut ghost = DataRecord::with_computed_total("Ghost", 1.0, 1.0, 1.0);
    ghost.index = Some(40);
    assert!(!client.fix(&ghost).unwrap());

    let lines = client.server_log().unwrap();
    assert_eq!(
        lines.last().map(String::as_str),
        Some("Server successfully updated record #40 for Client 8.")
    );
}

// =============================================================================
// Framing Tests
// =============================================================================

#[test]
fn test_bad_frame_is_skipped() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    // A frame of garbage: checksum cannot match
    stream.write_all(&[0x5Au8; PACKET_SIZE]).unwrap();
    write_packet(&mut stream, &Request::new(3, Command::Count).to_packet().unwrap()).unwrap();

    let packet = read_packet(&mut stream).unwrap();
    assert_eq!(
        Response::from_packet(packet, ResponseKind::Count).unwrap(),
        Response::Count(0)
    );
}

#[test]
fn test_unknown_command_is_skipped() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let mut unknown = Packet::new(3, CommandCode::Cnt, 0, "");
    unknown.command = *b"DEL";
    write_packet(&mut stream, &unknown).unwrap();
    write_packet(
        &mut stream,
        &Request::new(3, Command::Get(Selector::All))
            .to_packet()
            .unwrap(),
    )
    .unwrap();
    write_packet(&mut stream, &Request::new(3, Command::Count).to_packet().unwrap()).unwrap();

    // GET -999 on an empty store sends nothing, so the next packet is the count
    let packet = read_packet(&mut stream).unwrap();
    assert_eq!(packet.code().unwrap(), CommandCode::Cnt);
}

#[test]
fn test_fix_index_zero_gets_failure_ack() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    let fix = Packet::new(7, CommandCode::Fix, 0, "Jan '21,18.00,10.00,3.00,5.00");
    write_packet(&mut stream, &fix).unwrap();

    let packet = read_packet(&mut stream).unwrap();
    assert_eq!(
        Response::from_packet(packet, ResponseKind::Ack(CommandCode::Fix)).unwrap(),
        Response::Ack {
            command: CommandCode::Fix,
            index: 0,
            success: false,
        }
    );

    // Nothing was written and the connection still answers
    write_packet(&mut stream, &Request::new(7, Command::Count).to_packet().unwrap()).unwrap();
    let packet = read_packet(&mut stream).unwrap();
    assert_eq!(
        Response::from_packet(packet, ResponseKind::Count).unwrap(),
        Response::Count(0)
    );
}

#[test]
fn test_get_non_positive_index_gets_empty_record() {
    let server = TestServer::start();
    let mut client = Client::with_id(server.addr, 7).unwrap();
    client
        .add(&DataRecord::with_computed_total("Jan '21", 5.0, 10.0, 3.0))
        .unwrap();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    for index in [0, -5] {
        write_packet(&mut stream, &Packet::new(7, CommandCode::Get, index, "")).unwrap();

        let packet = read_packet(&mut stream).unwrap();
        assert_eq!(
            Response::from_packet(packet, ResponseKind::Record).unwrap(),
            Response::Record(String::new())
        );
    }

    // The connection is still usable
    write_packet(&mut stream, &Request::new(7, Command::Count).to_packet().unwrap()).unwrap();
    let packet = read_packet(&mut stream).unwrap();
    assert_eq!(
        Response::from_packet(packet, ResponseKind::Count).unwrap(),
        Response::Count(1)
    );
}

#[test]
fn test_out_of_range_requests_are_audited() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    write_packet(&mut stream, &Packet::new(9, CommandCode::Get, 0, "")).unwrap();
    read_packet(&mut stream).unwrap();
    write_packet(&mut stream, &Packet::new(9, CommandCode::Fix, -3, "x")).unwrap();
    read_packet(&mut stream).unwrap();

    // Audit lines follow the responses, so poll the file
    wait_until("out-of-range audit lines", || {
        let log = std::fs::read_to_string(server.engine.log_path()).unwrap();
        log.contains("Server responded to Client 9 with record #0.\n")
            && log.contains("Server successfully updated record #-3 for Client 9.\n")
    });
}

#[test]
fn test_responses_carry_server_identity() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();

    write_packet(&mut stream, &Request::new(3, Command::Count).to_packet().unwrap()).unwrap();
    let packet = read_packet(&mut stream).unwrap();

    assert_eq!(packet.sender, std::process::id());
}

// =============================================================================
// Connection Management Tests
// =============================================================================

#[test]
fn test_connection_cap_rejects_extra_clients() {
    let server = TestServer::start_with(|builder| builder.max_connections(1));

    let mut first = Client::connect(server.addr).unwrap();
    first.count().unwrap();

    let mut second = Client::connect(server.addr).unwrap();
    assert!(second.count().is_err());

    // The first client is unaffected
    assert_eq!(first.count().unwrap(), 0);

    drop(first);
    wait_until("first handler to exit", || {
        server.server.active_connections() == 0
    });

    let mut third = Client::connect(server.addr).unwrap();
    assert_eq!(third.count().unwrap(), 0);
}

#[test]
fn test_disconnect_does_not_affect_others() {
    let server = TestServer::start();

    let mut survivor = Client::connect(server.addr).unwrap();
    {
        let mut doomed = TcpStream::connect(server.addr).unwrap();
        // Half a frame, then hang up
        doomed.write_all(&[1u8; PACKET_SIZE / 2]).unwrap();
    }

    assert!(survivor
        .add(&DataRecord::with_computed_total("Feb '21", 1.0, 2.0, 3.0))
        .unwrap());
    assert_eq!(survivor.count().unwrap(), 1);
    wait_until("dropped handler to exit", || {
        server.server.active_connections() == 1
    });
    // The last audit line is written after the response
    wait_until("monitor to go idle", || {
        server.engine.monitor().snapshot().is_idle()
    });
}

#[test]
fn test_read_timeout_closes_idle_connection() {
    let server = TestServer::start_with(|builder| builder.read_timeout_ms(100));

    let _idle = TcpStream::connect(server.addr).unwrap();
    wait_until("handler to register", || {
        server.server.active_connections() == 1
    });

    wait_until("idle handler to time out", || {
        server.server.active_connections() == 0
    });
}
