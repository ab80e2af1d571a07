// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The shared event mempool: an append-only, deduplicated set keyed by
//! event `uuid`, bounded in size with oldest-first eviction, serialized
//! under one lock the way the connection pool is (see `valnet-pool`) —
//! mutating operations never hold the lock across socket I/O because
//! nothing here ever touches a socket.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use tracing::debug;
use uuid::Uuid;
use valnet_primitives::Event;

/// Default retained event count (SPEC_FULL §11 `mempool_capacity`).
pub const DEFAULT_CAPACITY: usize = 10_000;

struct Inner {
    capacity: usize,
    events: HashMap<Uuid, Event>,
    order: VecDeque<Uuid>,
}

/// A bounded, deduplicated, thread-safe set of [`Event`]s.
pub struct Mempool {
    inner: Mutex<Inner>,
}

/// Outcome of [`Mempool::insert`], so callers can log without the mempool
/// itself deciding what's worth a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Duplicate,
}

impl Mempool {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                capacity,
                events: HashMap::new(),
                order: VecDeque::new(),
            }),
        }
    }

    /// Insert `event`, deduplicating by `uuid`. When at capacity, the oldest
    /// admitted event is evicted first to make room — duplicates are always
    /// silently dropped regardless of capacity (SPEC_FULL §4 `EVENT` handling).
    pub fn insert(&self, event: Event) -> InsertOutcome {
        let mut guard = self.inner.lock();
        if guard.events.contains_key(&event.uuid) {
            return InsertOutcome::Duplicate;
        }

        if guard.events.len() >= guard.capacity {
            if let Some(oldest) = guard.order.pop_front() {
                guard.events.remove(&oldest);
                debug!(evicted = %oldest, "mempool at capacity, evicted oldest event");
            }
        }

        guard.order.push_back(event.uuid);
        guard.events.insert(event.uuid, event);
        InsertOutcome::Inserted
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.inner.lock().events.contains_key(uuid)
    }

    pub fn get(&self, uuid: &Uuid) -> Option<Event> {
        self.inner.lock().events.get(uuid).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn all(&self) -> Vec<Event> {
        let guard = self.inner.lock();
        guard
            .order
            .iter()
            .filter_map(|id| guard.events.get(id).cloned())
            .collect()
    }
}

impl Default for Mempool {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
