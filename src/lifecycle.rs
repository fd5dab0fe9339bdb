//! Connection lifecycle policies.
//!
//! A [`Lifecycle`] owns the client's connection slot and decides how a
//! [`Connection`] is obtained for each request:
//!
//! - [`AutoReconnect`] dials lazily, reuses a connection while it passes a
//!   liveness probe, and discards it after any I/O failure so the next call
//!   dials again. The slot sits behind a `Mutex`.
//! - [`ManualConnect`] only dials when the caller calls
//!   [`ManualConnect::connect`]. No probing, no locking, no redial.
//!
//! # State Machine
//!
//! ```text
//!            dial ok               probe ok
//! Absent ─────────────────▶ Live ◀────────┐
//!   ▲                        │  └─────────┘
//!   └────────────────────────┘
//!     probe failed / I/O failure / close
//! ```
//!
//! Dial and probe happen while the lock is held. The request itself runs
//! outside the lock on a shared handle, so a persistent client must carry one
//! request at a time: two concurrent requests would interleave on one stream.

use std::cell::RefCell;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::connection::{ConnectOptions, Connection};
use crate::error::{McError, Result};

/// Observable state of a connection slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket; the next use must dial.
    Absent,
    /// A dialed socket, assumed usable.
    Live,
}

type Slot = Option<Arc<Connection>>;

fn state_of(slot: &Slot) -> ConnectionState {
    match slot {
        Some(_) => ConnectionState::Live,
        None => ConnectionState::Absent,
    }
}

fn close_slot(slot: &mut Slot) -> Result<()> {
    match slot.take() {
        Some(conn) => {
            debug!(addr = %conn.remote_addr(), "closing connection");
            conn.shutdown()?;
            Ok(())
        }
        None => Ok(()),
    }
}

/// How a client obtains and gives up its connection.
pub trait Lifecycle {
    /// Returns a connection to run one request on.
    fn acquire(&self) -> Result<Arc<Connection>>;

    /// Reports that a request on `conn` failed with an I/O error.
    fn release_on_failure(&self, conn: &Arc<Connection>);

    /// Closes the stored connection, if any. Idempotent.
    fn close(&self) -> Result<()>;

    /// Returns whether a connection is currently stored.
    fn state(&self) -> ConnectionState;
}

/// Lazily dialed, self-repairing connection slot.
///
/// Safe to share between threads, but see the module docs: requests must not
/// overlap on one client.
#[derive(Debug)]
pub struct AutoReconnect {
    target: SocketAddr,
    options: ConnectOptions,
    slot: Mutex<Slot>,
}

impl AutoReconnect {
    /// Creates an empty slot for `target`. Nothing is dialed yet.
    pub fn new(target: SocketAddr, options: ConnectOptions) -> Self {
        Self {
            target,
            options,
            slot: Mutex::new(None),
        }
    }

    /// Returns the configured PLC address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    // The slot is plain data, so a panic while it was held leaves nothing half-updated.
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Lifecycle for AutoReconnect {
    fn acquire(&self) -> Result<Arc<Connection>> {
        let mut slot = self.lock();

        if let Some(conn) = slot.as_ref() {
            match conn.probe() {
                Ok(()) => return Ok(Arc::clone(conn)),
                Err(e) => {
                    debug!(addr = %self.target, error = %e, "liveness probe failed, redialing");
                    // already known dead; a shutdown error adds nothing
                    let _ = close_slot(&mut slot);
                }
            }
        }

        let conn = Arc::new(Connection::dial(self.target, &self.options)?);
        *slot = Some(Arc::clone(&conn));
        Ok(conn)
    }

    fn release_on_failure(&self, conn: &Arc<Connection>) {
        let mut slot = self.lock();
        debug!(addr = %self.target, "discarding connection after I/O failure");

        let _ = conn.shutdown();
        if slot.as_ref().is_some_and(|stored| Arc::ptr_eq(stored, conn)) {
            *slot = None;
        }
    }

    fn close(&self) -> Result<()> {
        close_slot(&mut self.lock())
    }

    fn state(&self) -> ConnectionState {
        state_of(&self.lock())
    }
}

/// Caller-managed connection slot for single-threaded use.
///
/// The slot is a `RefCell`, so this type is deliberately not `Sync`.
#[derive(Debug)]
pub struct ManualConnect {
    target: SocketAddr,
    options: ConnectOptions,
    slot: RefCell<Slot>,
}

impl ManualConnect {
    /// Creates an empty slot for `target`.
    pub fn new(target: SocketAddr, options: ConnectOptions) -> Self {
        Self {
            target,
            options,
            slot: RefCell::new(None),
        }
    }

    /// Returns the configured PLC address.
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Closes any existing connection, then dials a new one.
    ///
    /// # Errors
    ///
    /// Returns [`McError::Connection`] if the dial fails. The slot is left
    /// empty in that case.
    pub fn connect(&self) -> Result<()> {
        let mut slot = self.slot.borrow_mut();
        // replacing it either way
        let _ = close_slot(&mut slot);
        *slot = Some(Arc::new(Connection::dial(self.target, &self.options)?));
        Ok(())
    }
}

impl Lifecycle for ManualConnect {
    fn acquire(&self) -> Result<Arc<Connection>> {
        self.slot.borrow().clone().ok_or(McError::NotConnected)
    }

    fn release_on_failure(&self, conn: &Arc<Connection>) {
        debug!(addr = %conn.remote_addr(), "request failed; connection kept until reconnect");
    }

    fn close(&self) -> Result<()> {
        close_slot(&mut self.slot.borrow_mut())
    }

    fn state(&self) -> ConnectionState {
        state_of(&self.slot.borrow())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Shutdown, TcpListener};
    use std::thread;

    fn listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    #[test]
    fn test_auto_starts_absent() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());
        assert_eq!(lifecycle.state(), ConnectionState::Absent);
        assert_eq!(lifecycle.target(), addr);
    }

    #[test]
    fn test_auto_acquire_reuses_live_connection() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        let first = lifecycle.acquire().unwrap();
        let second = lifecycle.acquire().unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(lifecycle.state(), ConnectionState::Live);
    }

    #[test]
    fn test_auto_release_redials_next_time() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        let first = lifecycle.acquire().unwrap();
        lifecycle.release_on_failure(&first);
        assert_eq!(lifecycle.state(), ConnectionState::Absent);

        let second = lifecycle.acquire().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_auto_release_keeps_newer_connection() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        let stale = lifecycle.acquire().unwrap();
        lifecycle.release_on_failure(&stale);
        let fresh = lifecycle.acquire().unwrap();

        lifecycle.release_on_failure(&stale);
        assert_eq!(lifecycle.state(), ConnectionState::Live);
        assert!(Arc::ptr_eq(&fresh, &lifecycle.acquire().unwrap()));
    }

    #[test]
    fn test_auto_dial_failure() {
        let (listener, addr) = listener();
        drop(listener);
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        let err = lifecycle.acquire().unwrap_err();
        assert!(matches!(err, McError::Connection { .. }));
        assert_eq!(lifecycle.state(), ConnectionState::Absent);
    }

    #[test]
    fn test_auto_close_idempotent() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        lifecycle.close().unwrap();
        lifecycle.acquire().unwrap();
        lifecycle.close().unwrap();
        lifecycle.close().unwrap();
        assert_eq!(lifecycle.state(), ConnectionState::Absent);
    }

    #[test]
    fn test_auto_acquire_redials_after_failed_probe() {
        let (_listener, addr) = listener();
        let lifecycle = AutoReconnect::new(addr, ConnectOptions::default());

        let first = lifecycle.acquire().unwrap();
        first.stream().shutdown(Shutdown::Write).unwrap();
        assert!(first.probe().is_err());

        let second = lifecycle.acquire().unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(lifecycle.state(), ConnectionState::Live);
    }

    #[test]
    fn test_auto_concurrent_acquire_dials_once() {
        let (listener, addr) = listener();
        let lifecycle = Arc::new(AutoReconnect::new(addr, ConnectOptions::default()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lifecycle = Arc::clone(&lifecycle);
                thread::spawn(move || lifecycle.acquire().unwrap())
            })
            .collect();
        let conns: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(conns.iter().all(|c| Arc::ptr_eq(c, &conns[0])));

        listener.set_nonblocking(true).unwrap();
        let mut accepted = 0;
        while listener.accept().is_ok() {
            accepted += 1;
        }
        assert_eq!(accepted, 1);
    }

    #[test]
    fn test_manual_acquire_before_connect() {
        let (_listener, addr) = listener();
        let lifecycle = ManualConnect::new(addr, ConnectOptions::default());

        assert!(matches!(lifecycle.acquire(), Err(McError::NotConnected)));
    }

    #[test]
    fn test_manual_connect_replaces_connection() {
        let (_listener, addr) = listener();
        let lifecycle = ManualConnect::new(addr, ConnectOptions::default());

        lifecycle.connect().unwrap();
        let first = lifecycle.acquire().unwrap();
        lifecycle.connect().unwrap();
        let second = lifecycle.acquire().unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_manual_release_keeps_connection() {
        let (_listener, addr) = listener();
        let lifecycle = ManualConnect::new(addr, ConnectOptions::default());

        lifecycle.connect().unwrap();
        let conn = lifecycle.acquire().unwrap();
        lifecycle.release_on_failure(&conn);

        assert_eq!(lifecycle.state(), ConnectionState::Live);
    }

    #[test]
    fn test_manual_close() {
        let (_listener, addr) = listener();
        let lifecycle = ManualConnect::new(addr, ConnectOptions::default());

        lifecycle.connect().unwrap();
        lifecycle.close().unwrap();
        lifecycle.close().unwrap();
        assert_eq!(lifecycle.state(), ConnectionState::Absent);
    }

    #[test]
    fn test_manual_connect_failure_leaves_absent() {
        let (listener, addr) = listener();
        let lifecycle = ManualConnect::new(addr, ConnectOptions::default());
        lifecycle.connect().unwrap();
        drop(listener);

        assert!(lifecycle.connect().is_err());
        assert_eq!(lifecycle.state(), ConnectionState::Absent);
    }
}
