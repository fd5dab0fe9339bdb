//! TCP connection to a PLC.
//!
//! This module provides the [`Connection`] struct which owns one TCP stream to
//! the PLC. It knows about sockets and bytes only: frame building lives in the
//! [`Station`](crate::Station) and response validation in the client.
//!
//! # Design
//!
//! - **Borrowable** - all I/O goes through `&TcpStream`, so a connection can be
//!   shared behind an `Arc` and used outside the manager's lock
//! - **Synchronous** - blocking write/read, timeouts only if configured
//! - **One read per response** - [`Connection::recv`] issues a single `read`,
//!   the returned length is authoritative
//!
//! # Example
//!
//! ```no_run
//! use melsec_mc::{ConnectOptions, Connection};
//!
//! let conn = Connection::dial("192.168.3.39:5000".parse().unwrap(), &ConnectOptions::default())?;
//! conn.send(&[0x50, 0x00])?;
//! let response = conn.recv(22)?;
//! # Ok::<(), melsec_mc::McError>(())
//! ```

use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{McError, Result};
use crate::utils::format_frame;

/// Socket options applied when dialing.
///
/// Every timeout defaults to `None`, leaving the OS defaults in place.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConnectOptions {
    /// Maximum time to wait for the TCP handshake.
    pub connect_timeout: Option<Duration>,
    /// Read timeout set on the stream.
    pub read_timeout: Option<Duration>,
    /// Write timeout set on the stream.
    pub write_timeout: Option<Duration>,
}

/// A dialed TCP stream plus the address it was dialed from.
pub struct Connection {
    stream: TcpStream,
    remote_addr: SocketAddr,
}

impl Connection {
    /// Dials a new TCP connection to `addr`.
    ///
    /// # Arguments
    ///
    /// * `addr` - Socket address of the PLC (IP:port)
    /// * `options` - Connect, read and write timeouts
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if the dial fails or the socket
    /// cannot be configured.
    pub fn dial(addr: SocketAddr, options: &ConnectOptions) -> Result<Self> {
        let stream = match options.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        }
        .map_err(|e| McError::connection(addr, e))?;

        stream
            .set_read_timeout(options.read_timeout)
            .and_then(|()| stream.set_write_timeout(options.write_timeout))
            .map_err(|e| McError::connection(addr, e))?;

        debug!(%addr, local = ?stream.local_addr().ok(), "dialed PLC");

        Ok(Self {
            stream,
            remote_addr: addr,
        })
    }

    /// Best-effort liveness check: a zero-length write.
    ///
    /// This catches sockets the OS already knows are dead. It does not detect
    /// a peer that closed or vanished without the local stack noticing.
    pub fn probe(&self) -> io::Result<()> {
        (&self.stream).write(&[]).map(|_| ())
    }

    /// Writes the whole request frame.
    pub fn send(&self, frame: &[u8]) -> Result<()> {
        trace!(addr = %self.remote_addr, frame = %format_frame(frame), "tx");
        (&self.stream).write_all(frame)?;
        Ok(())
    }

    /// Reads one response into a buffer of exactly `capacity` bytes.
    ///
    /// Issues a single `read`: the result holds the bytes that arrived in that
    /// read and may be shorter than `capacity`.
    ///
    /// # Errors
    ///
    /// Returns [`McError::Io`] on read failure and [`McError::ProtocolLength`]
    /// when the peer closed the stream (a zero-byte read).
    pub fn recv(&self, capacity: usize) -> Result<Vec<u8>> {
        let mut buffer = vec![0u8; capacity];
        let size = (&self.stream).read(&mut buffer)?;
        if size == 0 && capacity > 0 {
            return Err(McError::protocol_length(capacity, 0));
        }
        buffer.truncate(size);
        trace!(addr = %self.remote_addr, frame = %format_frame(&buffer), "rx");
        Ok(buffer)
    }

    /// Closes both halves of the stream.
    ///
    /// A stream the peer already tore down is not an error.
    pub fn shutdown(&self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e),
            _ => Ok(()),
        }
    }

    /// Returns the remote PLC address.
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns a reference to the underlying stream.
    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("remote_addr", &self.remote_addr)
            .field("local_addr", &self.stream.local_addr().ok())
            .finish()
    }
}
