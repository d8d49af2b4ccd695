//! Network Module
//!
//! TCP server, per-connection handler and a blocking client.
//!
//! ## Architecture
//! - Single acceptor thread polling a non-blocking listener
//! - One handler thread per accepted connection
//! - Every store access goes through the shared `Engine`

mod server;
mod connection;
mod client;

pub use server::{Server, ShutdownHandle};
pub use connection::Connection;
pub use client::Client;
