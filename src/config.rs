//! Configuration for recstore
//!
//! Centralized configuration with sensible defaults.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Well-known port the server listens on unless told otherwise
pub const DEFAULT_PORT: u16 = 15005;

/// Main configuration for a recstore server
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for both shared files
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── {records_file}   (fixed-slot record store)
    ///     └── {log_file}       (append-only audit log)
    pub data_dir: PathBuf,

    /// File name of the record store inside `data_dir`
    pub records_file: String,

    /// File name of the audit log inside `data_dir`
    pub log_file: String,

    // -------------------------------------------------------------------------
    // Monitor Configuration
    // -------------------------------------------------------------------------
    /// Identity key of the monitor. `None` means "use the listening port".
    pub monitor_key: Option<u32>,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = wait forever)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = wait forever)
    pub write_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./recstore_data"),
            records_file: "records.bin".to_string(),
            log_file: "server.log".to_string(),
            monitor_key: None,
            listen_addr: format!("127.0.0.1:{}", DEFAULT_PORT),
            max_connections: 1024,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the record store
    pub fn records_path(&self) -> PathBuf {
        self.data_dir.join(&self.records_file)
    }

    /// Full path of the audit log
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file)
    }

    /// Key the monitor is identified by
    ///
    /// Falls back to the port of `listen_addr`, then to [`DEFAULT_PORT`].
    pub fn monitor_key(&self) -> u32 {
        self.monitor_key.unwrap_or_else(|| {
            self.listen_addr
                .parse::<SocketAddr>()
                .map(|addr| addr.port())
                .unwrap_or(DEFAULT_PORT) as u32
        })
    }

    /// Check values that would otherwise fail much later
    pub fn validate(&self) -> Result<()> {
        if self.records_file.is_empty() || self.log_file.is_empty() {
            return Err(StoreError::Config(
                "records_file and log_file must be non-empty".to_string(),
            ));
        }
        if self.records_file == self.log_file {
            return Err(StoreError::Config(format!(
                "records_file and log_file must differ (both are {:?})",
                self.records_file
            )));
        }
        if self.max_connections == 0 {
            return Err(StoreError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory (root for both files)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the record store file name
    pub fn records_file(mut self, name: impl Into<String>) -> Self {
        self.config.records_file = name.into();
        self
    }

    /// Set the audit log file name
    pub fn log_file(mut self, name: impl Into<String>) -> Self {
        self.config.log_file = name.into();
        self
    }

    /// Set an explicit monitor key
    pub fn monitor_key(mut self, key: u32) -> Self {
        self.config.monitor_key = Some(key);
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
