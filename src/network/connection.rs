//! Connection Handler
//!
//! Runs the command loop for one client.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::audit::AuditEvent;
use crate::engine::Engine;
use crate::error::Result;
use crate::protocol::{
    read_packet, truncate_text, write_packet, Command, CommandCode, Request, Response, Selector,
};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Shared stores and monitor
    engine: Arc<Engine>,

    /// Peer address for logging
    peer_addr: String,

    /// Sender identity stamped on every response
    server_id: u32,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O on the accepted stream
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm; every exchange is one small packet
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            peer_addr,
            server_id: std::process::id(),
        })
    }

    /// Configure connection timeouts (0 = block forever)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads one command at a time and answers it. Returns `Ok` when the
    /// client goes away, `Err` on any other transport failure.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        self.record_audit(AuditEvent::Connected {
            addr: self.peer_addr.clone(),
        });

        loop {
            // Read next command
            let packet = match read_packet(&mut self.reader) {
                Ok(packet) => packet,
                Err(e) if e.is_disconnect() => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.is_timeout() => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(crate::StoreError::Io(e)) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    return Err(e.into());
                }
                Err(e) => {
                    // Frames are fixed-size, so the stream is still in step
                    tracing::warn!("Ignoring bad packet from {}: {}", self.peer_addr, e);
                    continue;
                }
            };

            let request = match Request::from_packet(packet) {
                Ok(request) => request,
                Err(e) => {
                    // Only an unidentifiable command gets here; it has no reply
                    tracing::warn!("Ignoring request from {}: {}", self.peer_addr, e);
                    continue;
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, request);

            if let Err(e) = self.execute(request) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error serving {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Execute one command: respond first, then append its audit line
    fn execute(&mut self, request: Request) -> Result<()> {
        let client = request.sender;

        let event = match request.command {
            Command::Count => {
                let count = self.engine.record_count()?;
                self.send(Response::Count(count))?;
                AuditEvent::Counted { client, count }
            }

            Command::Get(Selector::One(index)) => {
                let text = self.engine.record_text(index)?;
                self.send(Response::Record(truncate_text(&text).to_string()))?;
                AuditEvent::SentRecord {
                    client,
                    index: i64::from(index),
                }
            }

            Command::Get(Selector::All) => {
                let count = self.engine.record_count()?;
                for index in 1..=count {
                    let text = self.engine.record_text(index)?;
                    self.send(Response::Record(truncate_text(&text).to_string()))?;
                }
                AuditEvent::SentAllRecords { client, count }
            }

            Command::Fix { index, record } => {
                let success = self.engine.apply_fix(index, &record)?;
                self.send(Response::Ack {
                    command: CommandCode::Fix,
                    index: index as i32,
                    success,
                })?;
                AuditEvent::Updated {
                    client,
                    index: i64::from(index),
                }
            }

            Command::New { record } => {
                let success = self.engine.apply_new(&record)?;
                self.send(Response::Ack {
                    command: CommandCode::New,
                    index: -1,
                    success,
                })?;
                AuditEvent::Added { client }
            }

            // No slot has this index: the same answer as an empty slot
            Command::OutOfRange {
                code: CommandCode::Get,
                index,
            } => {
                self.send(Response::Record(String::new()))?;
                AuditEvent::SentRecord {
                    client,
                    index: i64::from(index),
                }
            }

            Command::OutOfRange { code, index } => {
                self.send(Response::Ack {
                    command: code,
                    index,
                    success: false,
                })?;
                AuditEvent::Updated {
                    client,
                    index: i64::from(index),
                }
            }

            Command::Log => {
                let count = self.engine.log_count()?;
                self.send(Response::LogCount(count))?;

                // Lines are only ever appended, so the first `count` stay put
                let mut offset = 0;
                for _ in 0..count {
                    let line = match self.engine.log_line_at(offset)? {
                        Some((line, next)) => {
                            offset = next;
                            line
                        }
                        None => String::new(),
                    };
                    self.send(Response::LogLine(truncate_text(&line).to_string()))?;
                }
                AuditEvent::SentLog { client, count }
            }
        };

        self.record_audit(event);
        Ok(())
    }

    /// Send a response to the client
    fn send(&mut self, response: Response) -> Result<()> {
        write_packet(&mut self.writer, &response.to_packet(self.server_id))
    }

    /// Append an audit line; failures are reported and otherwise ignored
    fn record_audit(&self, event: AuditEvent) {
        if let Err(e) = self.engine.audit(&event) {
            tracing::warn!("Failed to write audit line {:?}: {}", event.to_string(), e);
        }
    }
}
