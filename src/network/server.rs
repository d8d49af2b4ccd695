//! TCP Server
//!
//! Accepts connections and hands each one to its own handler thread.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::utils::Backoff;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{Result, StoreError};

use super::Connection;

/// TCP server for recstore
pub struct Server {
    config: Config,

    engine: Arc<Engine>,

    listener: TcpListener,

    /// Set to stop the accept loop
    shutdown: Arc<AtomicBool>,

    /// Handler threads currently running
    active: Arc<AtomicUsize>,
}

/// Cloneable handle that stops a running [`Server`]
#[derive(Clone, Debug)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Ask the accept loop to stop; open connections run to completion
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

impl Server {
    /// Bind the listening socket
    ///
    /// The listener is non-blocking so the accept loop can notice shutdown.
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            StoreError::Network(format!("Failed to bind {}: {}", config.listen_addr, e))
        })?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
        }
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Number of connections being served right now
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking)
    ///
    /// Returns after [`shutdown`](Self::shutdown) is requested, or with an
    /// error if accepting fails for a reason other than "nothing pending".
    pub fn run(&self) -> Result<()> {
        let backoff = Backoff::new();

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    backoff.reset();
                    self.dispatch(stream, addr)?;
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    if backoff.is_completed() {
                        thread::sleep(std::time::Duration::from_millis(10));
                    } else {
                        backoff.snooze();
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Accept failed: {}", e);
                    return Err(StoreError::Network(format!("Accept failed: {}", e)));
                }
            }
        }

        tracing::info!("Server shutting down");
        Ok(())
    }

    /// Spawn a handler thread for an accepted connection
    fn dispatch(&self, stream: TcpStream, addr: SocketAddr) -> Result<()> {
        let active = ActiveGuard::enter(&self.active);
        if active.count() > self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: {} connections already open",
                addr,
                self.config.max_connections
            );
            return Ok(());
        }

        // Handlers use blocking reads
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Dropping {}: {}", addr, e);
            return Ok(());
        }

        let engine = Arc::clone(&self.engine);
        let read_ms = self.config.read_timeout_ms;
        let write_ms = self.config.write_timeout_ms;

        thread::Builder::new()
            .name(format!("conn-{}", addr))
            .spawn(move || {
                let _active = active;
                let mut conn = match Connection::new(stream, engine) {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!("Failed to set up connection from {}: {}", addr, e);
                        return;
                    }
                };
                if let Err(e) = conn.set_timeouts(read_ms, write_ms) {
                    tracing::warn!("Failed to set timeouts for {}: {}", addr, e);
                    return;
                }
                match conn.handle() {
                    Ok(()) => tracing::debug!("Connection {} closed", addr),
                    Err(e) => tracing::warn!("Connection {} ended with error: {}", addr, e),
                }
            })
            .map_err(|e| StoreError::Network(format!("Failed to spawn handler: {}", e)))?;

        Ok(())
    }
}

/// Counts one running handler for as long as it lives
struct ActiveGuard {
    active: Arc<AtomicUsize>,
    count: usize,
}

impl ActiveGuard {
    fn enter(active: &Arc<AtomicUsize>) -> Self {
        let count = active.fetch_add(1, Ordering::SeqCst) + 1;
        Self {
            active: Arc::clone(active),
            count,
        }
    }

    fn count(&self) -> usize {
        self.count
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}
