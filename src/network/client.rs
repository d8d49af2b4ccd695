//! Blocking client
//!
//! Speaks the request/response exchanges listed in [`crate::protocol`].

use std::io::{BufReader, BufWriter};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{Result, StoreError};
use crate::protocol::{
    read_packet, write_packet, Command, CommandCode, Request, Response, ResponseKind, Selector,
};
use crate::record::DataRecord;

/// One connection to a recstore server
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Sender identity stamped on every request
    id: u32,
}

impl Client {
    /// Connect, identifying as this process
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        Self::with_id(addr, std::process::id())
    }

    /// Connect with an explicit sender identity
    pub fn with_id<A: ToSocketAddrs>(addr: A, id: u32) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .map_err(|e| StoreError::Network(format!("Failed to connect: {}", e)))?;
        stream.set_nodelay(true)?;
        let read_stream = stream.try_clone()?;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            id,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    /// Number of records on the server
    pub fn count(&mut self) -> Result<u32> {
        self.send(Command::Count)?;
        match self.receive(ResponseKind::Count)? {
            Response::Count(n) => Ok(n),
            other => Err(unexpected(other)),
        }
    }

    /// Record `index`
    ///
    /// An index past the end of the store comes back as an empty slot and
    /// fails to decode. An index above `i32::MAX` is rejected before sending.
    pub fn get(&mut self, index: u32) -> Result<DataRecord> {
        self.send(Command::Get(Selector::One(index)))?;
        let text = self.receive_record()?;
        DataRecord::from_store_text(&text, Some(index))
    }

    /// Every record, in index order
    ///
    /// The list has no terminator, so this asks for the count first and
    /// then reads that many records. Records appended by other clients
    /// between the two requests desynchronize the stream.
    pub fn get_all(&mut self) -> Result<Vec<DataRecord>> {
        let count = self.count()?;
        self.send(Command::Get(Selector::All))?;

        let mut records = Vec::with_capacity(count as usize);
        for index in 1..=count {
            let text = self.receive_record()?;
            records.push(DataRecord::from_store_text(&text, Some(index))?);
        }
        Ok(records)
    }

    /// Overwrite the record at `record.index`
    pub fn fix(&mut self, record: &DataRecord) -> Result<bool> {
        let index = record.index.ok_or_else(|| {
            StoreError::Protocol("FIX: record has no index assigned".to_string())
        })?;
        let text = record.to_store_text()?;
        self.send(Command::Fix {
            index,
            record: text,
        })?;
        self.receive_ack(CommandCode::Fix)
    }

    /// Append `record` after the last stored one
    pub fn add(&mut self, record: &DataRecord) -> Result<bool> {
        let text = record.to_store_text()?;
        self.send(Command::New { record: text })?;
        self.receive_ack(CommandCode::New)
    }

    /// The server's audit log, oldest line first
    pub fn server_log(&mut self) -> Result<Vec<String>> {
        self.send(Command::Log)?;
        let count = match self.receive(ResponseKind::LogCount)? {
            Response::LogCount(n) => n,
            other => return Err(unexpected(other)),
        };

        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            match self.receive(ResponseKind::LogLine)? {
                Response::LogLine(line) => lines.push(line),
                other => return Err(unexpected(other)),
            }
        }
        Ok(lines)
    }

    // =========================================================================
    // Internal helpers
    // =========================================================================

    fn send(&mut self, command: Command) -> Result<()> {
        let request = Request::new(self.id, command);
        write_packet(&mut self.writer, &request.to_packet()?)
    }

    fn receive(&mut self, kind: ResponseKind) -> Result<Response> {
        let packet = read_packet(&mut self.reader)?;
        Response::from_packet(packet, kind)
    }

    fn receive_record(&mut self) -> Result<String> {
        match self.receive(ResponseKind::Record)? {
            Response::Record(text) => Ok(text),
            other => Err(unexpected(other)),
        }
    }

    fn receive_ack(&mut self, command: CommandCode) -> Result<bool> {
        match self.receive(ResponseKind::Ack(command))? {
            Response::Ack { success, .. } => Ok(success),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: Response) -> StoreError {
    StoreError::Protocol(format!("unexpected response: {:?}", response))
}
