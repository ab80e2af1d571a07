// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Bounded pool of live peer sockets, keyed by SS58 address.
//!
//! Ported from `smartdrive.validator.node.connection.connection_pool`: a
//! `multiprocessing.Manager` dict guarded by one lock becomes a
//! [`parking_lot::Mutex`] guarding a `HashMap`, since the networking core
//! runs as one multi-threaded process rather than a pool of workers sharing
//! state across a fork boundary. The locking discipline carries over
//! unchanged: every operation below takes the lock for a snapshot read or an
//! in-place mutation, and sockets slated for closing are always handed back
//! to the caller to close outside the lock, never closed while holding it.

mod error;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use valnet_primitives::ModuleInfo;

pub use error::PoolError;

/// One pooled peer: its advertised module metadata, its socket, and the
/// monotonic instant it was last confirmed alive.
pub struct Connection<S> {
    pub module: ModuleInfo,
    pub socket: S,
    pub last_seen: Instant,
}

impl<S> Connection<S> {
    fn new(module: ModuleInfo, socket: S) -> Self {
        Self {
            module,
            socket,
            last_seen: Instant::now(),
        }
    }

    fn is_active(&self, inactivity_timeout: Duration) -> bool {
        self.last_seen.elapsed() <= inactivity_timeout
    }
}

/// Thread-safe, capacity-bounded table of [`Connection`]s keyed by
/// `ss58_address`. Generic over the socket type so it can be exercised in
/// tests without a real `TcpStream`.
pub struct ConnectionPool<S> {
    capacity: usize,
    inactivity_timeout: Duration,
    inner: Mutex<HashMap<String, Connection<S>>>,
}

impl<S> ConnectionPool<S> {
    /// `inactivity_timeout` is the configured value an entry must be touched
    /// within to count as active; it flows in from `NetConfig` rather than
    /// being fixed here, so it stays in lockstep with `liveness.rs`'s ping
    /// interval.
    pub fn new(capacity: usize, inactivity_timeout: Duration) -> Self {
        Self {
            capacity,
            inactivity_timeout,
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn identifiers(&self) -> Vec<String> {
        self.inner.lock().keys().cloned().collect()
    }

    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.inner.lock().values().map(|c| c.module.clone()).collect()
    }

    /// Insert a new peer or replace an existing one's socket and metadata.
    /// Capacity is only enforced for a genuinely new identity; replacing an
    /// existing one never counts against it. On replace, the previous socket
    /// is returned for the caller to close after the lock is released.
    pub fn upsert(
        &self,
        identifier: impl Into<String>,
        module: ModuleInfo,
        socket: S,
    ) -> Result<Option<S>, PoolError> {
        let identifier = identifier.into();
        let mut guard = self.inner.lock();

        if !guard.contains_key(&identifier) && guard.len() >= self.capacity {
            return Err(PoolError::Full(self.capacity));
        }

        let previous = guard.insert(identifier, Connection::new(module, socket));
        Ok(previous.map(|c| c.socket))
    }

    /// Mark a present peer as seen right now.
    pub fn touch(&self, identifier: &str) {
        if let Some(connection) = self.inner.lock().get_mut(identifier) {
            connection.last_seen = Instant::now();
        }
    }

    pub fn remove(&self, identifier: &str) -> Option<S> {
        self.inner.lock().remove(identifier).map(|c| c.socket)
    }

    pub fn remove_many(&self, identifiers: &[String]) -> Vec<S> {
        let mut guard = self.inner.lock();
        identifiers
            .iter()
            .filter_map(|id| guard.remove(id).map(|c| c.socket))
            .collect()
    }

    /// Remove and return the sockets of every peer whose last ping is older
    /// than the configured inactivity timeout. Callers close the returned
    /// sockets themselves, after this call has released the lock.
    pub fn reap_inactive(&self) -> Vec<S> {
        let mut guard = self.inner.lock();
        let stale: Vec<String> = guard
            .iter()
            .filter(|(_, c)| !c.is_active(self.inactivity_timeout))
            .map(|(id, _)| id.clone())
            .collect();
        stale
            .into_iter()
            .filter_map(|id| guard.remove(&id).map(|c| c.socket))
            .collect()
    }
}

impl<S: Clone> ConnectionPool<S> {
    pub fn get(&self, identifier: &str) -> Option<Connection<S>> {
        self.inner.lock().get(identifier).map(|c| Connection {
            module: c.module.clone(),
            socket: c.socket.clone(),
            last_seen: c.last_seen,
        })
    }

    pub fn get_active(&self, identifier: &str) -> Option<Connection<S>> {
        self.get(identifier)
            .filter(|c| c.is_active(self.inactivity_timeout))
    }

    pub fn all(&self) -> Vec<Connection<S>> {
        self.inner
            .lock()
            .values()
            .map(|c| Connection {
                module: c.module.clone(),
                socket: c.socket.clone(),
                last_seen: c.last_seen,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valnet_primitives::ConnectionInfo;

    const TEST_TIMEOUT: Duration = Duration::from_secs(10);

    fn module(uid: u64, address: &str) -> ModuleInfo {
        ModuleInfo::new(uid, address, ConnectionInfo::parse("1.2.3.4:9001").unwrap())
    }

    #[test]
    fn upsert_then_get_round_trips() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(2, TEST_TIMEOUT);
        pool.upsert("5Fvalidator", module(0, "5Fvalidator"), 42).unwrap();
        let conn = pool.get("5Fvalidator").unwrap();
        assert_eq!(conn.socket, 42);
    }

    #[test]
    fn upsert_past_capacity_for_a_new_identity_is_rejected() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(1, TEST_TIMEOUT);
        pool.upsert("a", module(0, "a"), 1).unwrap();
        let err = pool.upsert("b", module(1, "b"), 2).unwrap_err();
        assert!(matches!(err, PoolError::Full(1)));
    }

    #[test]
    fn upsert_replacing_an_existing_identity_ignores_capacity() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(1, TEST_TIMEOUT);
        pool.upsert("a", module(0, "a"), 1).unwrap();
        let previous = pool.upsert("a", module(0, "a"), 2).unwrap();
        assert_eq!(previous, Some(1));
        assert_eq!(pool.get("a").unwrap().socket, 2);
    }

    #[test]
    fn remove_many_only_returns_sockets_that_existed() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(4, TEST_TIMEOUT);
        pool.upsert("a", module(0, "a"), 1).unwrap();
        let sockets = pool.remove_many(&["a".into(), "missing".into()]);
        assert_eq!(sockets, vec![1]);
        assert!(pool.get("a").is_none());
    }

    #[test]
    fn get_active_excludes_entries_past_the_timeout() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(4, TEST_TIMEOUT);
        pool.upsert("a", module(0, "a"), 1).unwrap();
        {
            let mut guard = pool.inner.lock();
            let conn = guard.get_mut("a").unwrap();
            conn.last_seen = Instant::now() - TEST_TIMEOUT - Duration::from_secs(1);
        }
        assert!(pool.get_active("a").is_none());
        assert!(pool.get("a").is_some());
    }

    #[test]
    fn get_active_respects_a_custom_configured_timeout() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(4, Duration::from_millis(1));
        pool.upsert("a", module(0, "a"), 1).unwrap();
        {
            let mut guard = pool.inner.lock();
            guard.get_mut("a").unwrap().last_seen =
                Instant::now() - Duration::from_millis(50);
        }
        assert!(pool.get_active("a").is_none());
    }

    #[test]
    fn reap_inactive_removes_only_stale_entries_and_returns_their_sockets() {
        let pool: ConnectionPool<u32> = ConnectionPool::new(4, TEST_TIMEOUT);
        pool.upsert("fresh", module(0, "fresh"), 1).unwrap();
        pool.upsert("stale", module(1, "stale"), 2).unwrap();
        {
            let mut guard = pool.inner.lock();
            guard.get_mut("stale").unwrap().last_seen =
                Instant::now() - TEST_TIMEOUT - Duration::from_secs(1);
        }

        let mut reaped = pool.reap_inactive();
        reaped.sort();
        assert_eq!(reaped, vec![2]);
        assert!(pool.get("fresh").is_some());
        assert!(pool.get("stale").is_none());
    }
}
