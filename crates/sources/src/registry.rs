//! Connection registry
//!
//! Process-wide table of live listener connections, used only for
//! coordinated shutdown: every accepted TCP connection and every UDP socket
//! task registers a cancellation token here, and `close_all` cancels them
//! all so their blocked reads return and the tasks unwind.
//!
//! The registry is an owned component passed by `Arc` to every listener;
//! handlers deregister themselves on exit, concurrently with the accept
//! loops that register new entries.

use std::collections::HashMap;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Registry of live connection cancellation tokens
///
/// # Invariants
///
/// - No two live entries share an ID; a freed ID may be reused.
/// - `remove` is idempotent: a handler may deregister a connection the
///   shutdown sweep already cancelled.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: Mutex<HashMap<u64, CancellationToken>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection's cancellation token, returning its ID
    ///
    /// IDs are the lowest unused non-negative integers, so they stay small
    /// and readable in logs even on long-lived processes.
    pub fn add(&self, token: CancellationToken) -> u64 {
        let mut conns = self.inner.lock();
        let mut id = 0u64;
        while conns.contains_key(&id) {
            id += 1;
        }
        conns.insert(id, token);
        id
    }

    /// Deregister a connection; a no-op when the ID is absent
    pub fn remove(&self, id: u64) {
        self.inner.lock().remove(&id);
    }

    /// Cancel every registered connection
    ///
    /// Tokens are snapshotted under the lock and cancelled after it is
    /// released, so handlers waking up can immediately re-acquire the lock
    /// to deregister themselves.
    pub fn close_all(&self) {
        let tokens: Vec<CancellationToken> = self.inner.lock().values().cloned().collect();
        for token in tokens {
            token.cancel();
        }
    }

    /// Point-in-time entry count, for shutdown-progress diagnostics only
    pub fn count(&self) -> usize {
        self.inner.lock().len()
    }
}
