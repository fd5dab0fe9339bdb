//! # MELSEC MC Protocol Client
//!
//! A Rust library for reading, writing and health-checking Mitsubishi PLCs over
//! TCP using the MC protocol, 3E binary frame.
//!
//! This is a **connection-and-exchange** library. Frames are built by a
//! [`Station`] you supply; this crate decodes them, owns the TCP connection,
//! sends each request, and reads back a response sized for the request kind.
//! Each call produces exactly 1 request and 1 response. No retries.
//!
//! ## Features
//!
//! - **Two lifecycles** - [`PersistentClient`] dials lazily and redials after
//!   failures; [`ExplicitClient`] connects only when told to
//! - **Deterministic** - one write, one read per call
//! - **Pluggable frames** - any [`Station`] implementation, including test stubs
//! - **No panics** - all errors returned as `Result<T, McError>`
//!
//! ## Quick Start
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
//! fn main() -> melsec_mc::Result<()> {
//!     let client = PersistentClient::new(ClientConfig::new("192.168.3.39", 5000), MyStation)?;
//!
//!     // Loopback self-test
//!     client.health_check()?;
//!
//!     // Read D100-D109 (raw response bytes)
//!     let response = client.read("D", 100, 10)?;
//!     println!("{} bytes", response.len());
//!
//!     // Write one word to D200
//!     client.write("D", 200, 1, &[0x34, 0x12])?;
//!
//!     client.close()
//! }
//! ```
//!
//! ## Response Sizes
//!
//! | Operation | Buffer | Returned |
//! |-----------|--------|----------|
//! | [`health_check`](Client::health_check) | 30 bytes | `()` if exactly 18 valid bytes |
//! | [`read`](Client::read) / [`bit_read`](Client::bit_read) | `22 + 2 * num_points` | bytes from one read |
//! | [`write`](Client::write) | 22 bytes | bytes from one read |
//!
//! Read and write responses are returned as they arrived in a single read and
//! may be shorter than the buffer. The [`utils`] module has helpers to pull the
//! end code and data words out of them.
//!
//! ## Error Handling
//!
//! ```no_run
//! use melsec_mc::{ClientConfig, McError, PersistentClient, Station};
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
//! match client.health_check() {
//!     Ok(()) => println!("PLC is answering"),
//!     Err(McError::Validation { field, received, .. }) => {
//!         println!("bad {} in response [{}]", field, received);
//!     }
//!     Err(e) if e.is_connection_fault() => println!("link dropped, next call redials: {}", e),
//!     Err(e) => println!("Error: {}", e),
//! }
//! # Ok::<(), McError>(())
//! ```
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (`debug` for dial/teardown, `trace` for
//! frame dumps) and never installs a subscriber.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

mod client;
mod connection;
mod error;
pub mod lifecycle;
pub mod response;
pub mod station;
pub mod utils;

// Public re-exports
pub use client::{Client, ClientConfig, ExplicitClient, PersistentClient};
pub use connection::{ConnectOptions, Connection};
pub use error::{HealthCheckField, McError, Result};
pub use lifecycle::{AutoReconnect, ConnectionState, Lifecycle, ManualConnect};
pub use station::Station;
