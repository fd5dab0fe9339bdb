//! MC protocol (3E frame) client.
//!
//! This module provides the [`Client`] struct, the primary interface for
//! talking to a PLC over TCP. One client serves one PLC endpoint.
//!
//! # Overview
//!
//! Each operation is one request and one response:
//!
//! 1. The [`Station`] builds the request frame as hex
//! 2. The frame is decoded to bytes (a bad frame fails before any I/O)
//! 3. The [`Lifecycle`] hands out a connection
//! 4. The frame is written and a single read fills a buffer sized for the
//!    request kind
//!
//! No automatic retries. After an I/O failure the persistent client drops its
//! connection, and the following call dials a fresh one.
//!
//! # Variants
//!
//! | Alias | Lifecycle | Connect | Thread use |
//! |-------|-----------|---------|------------|
//! | [`PersistentClient`] | [`AutoReconnect`] | lazy, automatic | shareable, one request at a time |
//! | [`ExplicitClient`] | [`ManualConnect`] | [`ExplicitClient::connect`] | single thread |
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{ClientConfig, PersistentClient, Station};
//! # struct MyStation;
//! # impl Station for MyStation {
//! #     fn build_health_check_request(&self) -> String { String::new() }
//! #     fn build_read_request(&self, _: &str, _: u32, _: u16) -> String { String::new() }
//! #     fn build_bit_read_request(&self, _: &str, _: u32, _: u16) -> String { String::new() }
//! #     fn build_write_request(&self, _: &str, _: u32, _: u16, _: &[u8]) -> String { String::new() }
//! # }
//!
//! let client = PersistentClient::new(ClientConfig::new("192.168.3.39", 5000), MyStation)?;
//!
//! client.health_check()?;
//! let response = client.read("D", 100, 10)?;
//! client.write("D", 100, 1, &[0x01, 0x00])?;
//! client.close()?;
//! # Ok::<(), melsec_mc::McError>(())
//! ```
//!
//! # Thread Safety
//!
//! A [`PersistentClient`] is `Sync` when its station is, and its lock
//! serializes dialing and teardown. The write and read of a request run
//! outside that lock, so callers must not have two requests in flight on the
//! same client. Wrap the client in a `Mutex` or give each thread its own
//! client if requests can overlap.

use std::io;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;

use crate::connection::ConnectOptions;
use crate::error::{McError, Result};
use crate::lifecycle::{AutoReconnect, ConnectionState, Lifecycle, ManualConnect};
use crate::response::{
    read_response_capacity, validate_health_check, HEALTH_CHECK_BUFFER_SIZE, WRITE_RESPONSE_SIZE,
};
use crate::station::{decode_frame, Station};

/// Configuration for creating an MC client.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClientConfig {
    /// PLC host name or IP address.
    pub host: String,
    /// PLC TCP port.
    pub port: u16,
    /// Socket options applied on every dial.
    #[cfg_attr(feature = "serde", serde(default))]
    pub options: ConnectOptions,
}

impl ClientConfig {
    /// Creates a configuration with no timeouts.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::ClientConfig;
    ///
    /// let config = ClientConfig::new("192.168.3.39", 5000);
    /// assert_eq!(config.options.read_timeout, None);
    /// ```
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            options: ConnectOptions::default(),
        }
    }

    /// Sets a timeout for the TCP handshake.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.options.connect_timeout = Some(timeout);
        self
    }

    /// Sets a read timeout on every dialed stream.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::ClientConfig;
    /// use std::time::Duration;
    ///
    /// let config = ClientConfig::new("192.168.3.39", 5000)
    ///     .with_read_timeout(Duration::from_secs(3));
    /// ```
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.options.read_timeout = Some(timeout);
        self
    }

    /// Sets a write timeout on every dialed stream.
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.options.write_timeout = Some(timeout);
        self
    }

    /// Resolves `host:port` to the first socket address.
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if resolution fails or yields nothing.
    pub fn resolve(&self) -> Result<SocketAddr> {
        let display = format!("{}:{}", self.host, self.port);
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| McError::connection(&display, e))?
            .next()
            .ok_or_else(|| {
                McError::connection(
                    &display,
                    io::Error::new(io::ErrorKind::InvalidInput, "no addresses resolved"),
                )
            })
    }
}

/// MC 3E client, generic over its [`Station`] and connection [`Lifecycle`].
///
/// Use the [`PersistentClient`] or [`ExplicitClient`] aliases to construct one.
pub struct Client<S, L = AutoReconnect> {
    station: S,
    lifecycle: L,
}

/// Client that dials lazily and redials after failures.
pub type PersistentClient<S> = Client<S, AutoReconnect>;

/// Client whose connection is opened by [`ExplicitClient::connect`].
pub type ExplicitClient<S> = Client<S, ManualConnect>;

impl<S: Station> Client<S, AutoReconnect> {
    /// Creates a persistent client. The address is resolved now; the first
    /// operation dials.
    ///
    /// # Arguments
    ///
    /// * `config` - PLC host, port and socket options
    /// * `station` - Frame builder used for every request
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if the address cannot be resolved.
    pub fn new(config: ClientConfig, station: S) -> Result<Self> {
        let target = config.resolve()?;
        Ok(Self::from_parts(station, AutoReconnect::new(target, config.options)))
    }
}

impl<S: Station> Client<S, ManualConnect> {
    /// Creates an explicit client. Nothing is dialed until [`connect`](Self::connect).
    ///
    /// # Arguments
    ///
    /// * `config` - PLC host, port and socket options
    /// * `station` - Frame builder used for every request
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if the address cannot be resolved.
    pub fn new(config: ClientConfig, station: S) -> Result<Self> {
        let target = config.resolve()?;
        Ok(Self::from_parts(station, ManualConnect::new(target, config.options)))
    }

    /// Closes any existing connection and dials a new one.
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if the dial fails.
    pub fn connect(&self) -> Result<()> {
        self.lifecycle.connect()
    }
}

impl<S: Station, L: Lifecycle> Client<S, L> {
    /// Assembles a client from a station and a lifecycle policy.
    pub fn from_parts(station: S, lifecycle: L) -> Self {
        Self { station, lifecycle }
    }

    /// Runs the loopback self-test.
    ///
    /// # Errors
    ///
    /// Returns [`McError::Validation`] if the response is not exactly 18
    /// bytes with `05 00` at offset 11 and `ABCDE` at offset 13, or any
    /// encoding, connection or I/O error.
    pub fn health_check(&self) -> Result<()> {
        let frame = self.station.build_health_check_request();
        let response = self.exchange(&frame, HEALTH_CHECK_BUFFER_SIZE)?;
        validate_health_check(&response)
    }

    /// Reads `num_points` words from `device_name` starting at `offset`.
    ///
    /// The buffer holds `22 + 2 * num_points` bytes. The returned bytes are
    /// whatever one read produced, possibly fewer than that.
    ///
    /// # Arguments
    ///
    /// * `device_name` - Device area passed to the station (e.g. `"D"`)
    /// * `offset` - Starting device number
    /// * `num_points` - Number of words to read
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use melsec_mc::{ClientConfig, PersistentClient, Station};
    /// # struct MyStation;
    /// # impl Station for MyStation {
    /// #     fn build_health_check_request(&self) -> String { String::new() }
    /// #     fn build_read_request(&self, _: &str, _: u32, _: u16) -> String { String::new() }
    /// #     fn build_bit_read_request(&self, _: &str, _: u32, _: u16) -> String { String::new() }
    /// #     fn build_write_request(&self, _: &str, _: u32, _: u16, _: &[u8]) -> String { String::new() }
    /// # }
    /// let client = PersistentClient::new(ClientConfig::new("192.168.3.39", 5000), MyStation)?;
    ///
    /// let response = client.read("D", 100, 10)?;
    /// println!("Read {} bytes", response.len());
    /// # Ok::<(), melsec_mc::McError>(())
    /// ```
    pub fn read(&self, device_name: &str, offset: u32, num_points: u16) -> Result<Vec<u8>> {
        let frame = self.station.build_read_request(device_name, offset, num_points);
        self.exchange(&frame, read_response_capacity(num_points))
    }

    /// Reads `num_points` bits from `device_name` starting at `offset`.
    ///
    /// Sized with the word formula, `22 + 2 * num_points` bytes.
    // TODO: bit-unit responses pack two points per byte on the wire; confirm
    // against a real PLC before tightening the buffer.
    pub fn bit_read(&self, device_name: &str, offset: u32, num_points: u16) -> Result<Vec<u8>> {
        let frame = self
            .station
            .build_bit_read_request(device_name, offset, num_points);
        self.exchange(&frame, read_response_capacity(num_points))
    }

    /// Writes `data` to `num_points` points at `device_name`/`offset`.
    ///
    /// Returns the acknowledgment, at most 22 bytes.
    ///
    /// # Arguments
    ///
    /// * `device_name` - Device area passed to the station (e.g. `"D"`)
    /// * `offset` - Starting device number
    /// * `num_points` - Number of points covered by `data`
    /// * `data` - Raw payload, encoded into the frame by the station
    pub fn write(
        &self,
        device_name: &str,
        offset: u32,
        num_points: u16,
        data: &[u8],
    ) -> Result<Vec<u8>> {
        let frame = self
            .station
            .build_write_request(device_name, offset, num_points, data);
        self.exchange(&frame, WRITE_RESPONSE_SIZE)
    }

    /// Closes the connection, if any. Calling it again is a no-op.
    pub fn close(&self) -> Result<()> {
        self.lifecycle.close()
    }

    /// Returns whether a connection is currently held.
    pub fn state(&self) -> ConnectionState {
        self.lifecycle.state()
    }

    /// Returns the station used to build frames.
    pub fn station(&self) -> &S {
        &self.station
    }

    /// Returns the lifecycle policy.
    pub fn lifecycle(&self) -> &L {
        &self.lifecycle
    }

    fn exchange(&self, frame: &str, capacity: usize) -> Result<Vec<u8>> {
        let payload = decode_frame(frame)?;
        let conn = self.lifecycle.acquire()?;

        let result = conn.send(&payload).and_then(|()| conn.recv(capacity));
        if let Err(e) = &result {
            if e.is_connection_fault() {
                self.lifecycle.release_on_failure(&conn);
            }
        }
        result
    }
}

impl<S, L: std::fmt::Debug> std::fmt::Debug for Client<S, L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("lifecycle", &self.lifecycle)
            .finish_non_exhaustive()
    }
}
