//! Error types for the MC protocol client.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use thiserror::Error;

/// Result type alias for MC protocol operations.
pub type Result<T> = std::result::Result<T, McError>;

/// Field of a health-check response that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthCheckField {
    /// Total response length.
    Length,
    /// Loopback byte count at offset 11..13.
    Header,
    /// Echoed loopback data at offset 13..18.
    Body,
}

impl fmt::Display for HealthCheckField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Length => "length",
            Self::Header => "header",
            Self::Body => "body",
        })
    }
}

/// Errors that can occur during MC protocol communication.
#[derive(Debug, Error)]
pub enum McError {
    /// The PLC address could not be resolved or dialed.
    #[error("Connection to {addr} failed: {source}")]
    Connection {
        /// Address that was being resolved or dialed.
        addr: String,
        /// Underlying network error.
        #[source]
        source: io::Error,
    },

    /// The station produced a frame that is not valid hex.
    #[error("Frame encoding error: {0}")]
    FrameEncoding(#[from] hex::FromHexError),

    /// I/O error while writing a request or reading a response.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Health-check response failed validation.
    #[error(
        "PLC health check failed: {field} mismatch, expected [{expected}], got [{actual}] (response [{received}])"
    )]
    Validation {
        /// Field that failed.
        field: HealthCheckField,
        /// Expected value, upper-case hex (or a decimal length).
        expected: String,
        /// Actual value found, upper-case hex (or a decimal length).
        actual: String,
        /// Complete response as received, upper-case hex.
        received: String,
    },

    /// The peer returned an empty or truncated frame.
    #[error("Unexpected frame length: expected up to {expected} bytes, received {actual}")]
    ProtocolLength {
        /// Capacity that was available for the frame.
        expected: usize,
        /// Bytes actually received.
        actual: usize,
    },

    /// Operation attempted on an explicit client before `connect()`.
    #[error("Not connected: call connect() first")]
    NotConnected,
}

impl McError {
    /// Creates a new `Connection` error for the given address.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    /// use std::io;
    ///
    /// let err = McError::connection("127.0.0.1:5000", io::ErrorKind::ConnectionRefused.into());
    /// assert!(err.to_string().contains("127.0.0.1:5000"));
    /// ```
    pub fn connection(addr: impl fmt::Display, source: io::Error) -> Self {
        Self::Connection {
            addr: addr.to_string(),
            source,
        }
    }

    /// Creates a new `Validation` error. `received` is the complete response.
    pub fn validation(
        field: HealthCheckField,
        expected: impl Into<String>,
        actual: impl Into<String>,
        received: &[u8],
    ) -> Self {
        Self::Validation {
            field,
            expected: expected.into(),
            actual: actual.into(),
            received: hex::encode_upper(received),
        }
    }

    /// Creates a new `ProtocolLength` error.
    ///
    /// # Example
    ///
    /// ```
    /// use melsec_mc::McError;
    ///
    /// let err = McError::protocol_length(22, 0);
    /// assert!(err.is_connection_fault());
    /// ```
    pub fn protocol_length(expected: usize, actual: usize) -> Self {
        Self::ProtocolLength { expected, actual }
    }

    /// Returns `true` if this error leaves the connection unusable.
    ///
    /// The persistent client discards its connection after such an error so
    /// the next call dials again.
    pub fn is_connection_fault(&self) -> bool {
        matches!(self, Self::Io(_) | Self::ProtocolLength { .. })
    }
}
