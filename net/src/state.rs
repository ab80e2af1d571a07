// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use ed25519_dalek::SigningKey;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;
use valnet_mempool::Mempool;
use valnet_pool::ConnectionPool;
use valnet_registry::RegistrySnapshotCache;

use crate::config::NetConfig;
use crate::db::DbCollaborator;

/// Everything the pool stores for one admitted peer: the write half, shared
/// between the receiver (which owns the read half directly) and any worker
/// that sends on demand (the pinger, `PONG` replies), plus a per-peer
/// cancellation token used to unblock the receiver's pending read when
/// another worker evicts this peer from the pool.
///
/// Whoever actually removes the entry from the pool owns the resulting
/// handle and is responsible for closing it via [`PeerHandle::close`] — the
/// pool hands a socket out at most once per removal, so this keeps "close
/// exactly once" true regardless of whether the receiver notices the frame
/// error first or a reconciliation/reap sweep evicts the peer first.
#[derive(Clone)]
pub struct PeerHandle {
    pub writer: Arc<AsyncMutex<OwnedWriteHalf>>,
    pub cancel: CancellationToken,
}

impl PeerHandle {
    pub fn new(writer: OwnedWriteHalf) -> Self {
        Self {
            writer: Arc::new(AsyncMutex::new(writer)),
            cancel: CancellationToken::new(),
        }
    }

    /// Unblock this peer's receiver and shut its socket's write side down.
    pub async fn close(&self) {
        self.cancel.cancel();
        let mut writer = self.writer.lock().await;
        let _ = tokio::io::AsyncWriteExt::shutdown(&mut *writer).await;
    }
}

/// Everything the accept loop, reconciliation loop, pinger, and receivers
/// share. Cheap to clone (every field is already an `Arc` or `Copy`-ish),
/// handed to each spawned worker as its own `Arc<NetState>`.
pub struct NetState {
    pub config: NetConfig,
    pub signing_key: SigningKey,
    pub local_ss58_address: String,
    pub pool: Arc<ConnectionPool<PeerHandle>>,
    pub mempool: Arc<Mempool>,
    pub registry: Arc<RegistrySnapshotCache>,
    /// Absent unless a caller wires one in via [`NetState::with_db`]; see
    /// [`DbCollaborator`] for why this stays unimplemented here.
    pub db: Option<Arc<dyn DbCollaborator>>,
}

impl NetState {
    pub fn new(
        config: NetConfig,
        signing_key: SigningKey,
        registry: Arc<RegistrySnapshotCache>,
    ) -> Arc<Self> {
        let local_ss58_address =
            valnet_primitives::ss58_from_public_key(&signing_key.verifying_key().to_bytes());
        let pool = Arc::new(ConnectionPool::new(
            config.max_connections,
            config.inactivity_timeout,
        ));
        let mempool = Arc::new(Mempool::new(config.mempool_capacity));
        Arc::new(Self {
            config,
            signing_key,
            local_ss58_address,
            pool,
            mempool,
            registry,
            db: None,
        })
    }

    /// Wire in a concrete [`DbCollaborator`] so `DB_SYNC_REQUEST`/
    /// `DB_SYNC_RESPONSE` frames are actually served instead of dropped.
    pub fn with_db(mut self: Arc<Self>, db: Arc<dyn DbCollaborator>) -> Arc<Self> {
        Arc::get_mut(&mut self)
            .expect("with_db called before any other Arc clone exists")
            .db = Some(db);
        self
    }
}
