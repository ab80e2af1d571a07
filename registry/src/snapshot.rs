// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, warn, Instrument};
use valnet_primitives::ModuleInfo;

use crate::client::RegistryClient;

/// A registry listing is never allowed to stay authoritative forever: past
/// this age a poll failure degrades the cache to empty rather than keep
/// acting on a possibly-deregistered module list (SPEC_FULL §4.2).
pub const MAX_SNAPSHOT_AGE: Duration = Duration::from_secs(60);

#[derive(Clone, Debug)]
struct Snapshot {
    modules: Vec<ModuleInfo>,
    fetched_at: Instant,
}

/// Polls a [`RegistryClient`]'s validator listing on a fixed interval and
/// serves the last good snapshot to callers, tolerating transient
/// chain-query failures by continuing to serve the previous snapshot with
/// its age attached.
pub struct RegistrySnapshotCache {
    client: Arc<dyn RegistryClient>,
    netuid: u16,
    inner: Mutex<Option<Snapshot>>,
}

impl RegistrySnapshotCache {
    pub fn new(client: Arc<dyn RegistryClient>, netuid: u16) -> Self {
        Self {
            client,
            netuid,
            inner: Mutex::new(None),
        }
    }

    /// The current validator listing and how old it is. An absent or stale
    /// (older than [`MAX_SNAPSHOT_AGE`]) snapshot is reported as empty, never
    /// as an error — the registry being unreachable should degrade gracefully
    /// into "no known peers", not take the caller down with it.
    pub fn current(&self) -> (Vec<ModuleInfo>, Duration) {
        let guard = self.inner.lock();
        match guard.as_ref() {
            Some(snapshot) => {
                let age = snapshot.fetched_at.elapsed();
                if age > MAX_SNAPSHOT_AGE {
                    (Vec::new(), age)
                } else {
                    (snapshot.modules.clone(), age)
                }
            }
            None => (Vec::new(), Duration::MAX),
        }
    }

    /// Query the chain once and replace the snapshot on success. On failure
    /// the existing snapshot (if any) is left untouched so `current` keeps
    /// serving it, aging, until it crosses [`MAX_SNAPSHOT_AGE`].
    ///
    /// Only the validator subset is cached: this snapshot backs the peer
    /// mesh (SPEC_FULL §4.4/§4.5), which only ever admits or dials other
    /// validators. Miners are looked up separately, on demand, by the miner
    /// RPC client (§4.8).
    pub async fn refresh_once(&self) {
        match self.client.list_validators(self.netuid).await {
            Ok(modules) => {
                *self.inner.lock() = Some(Snapshot {
                    modules,
                    fetched_at: Instant::now(),
                });
            }
            Err(err) => {
                warn!(error = %err, netuid = self.netuid, "registry poll failed, serving stale snapshot");
            }
        }
    }

    /// Run `refresh_once` on `poll_interval` until `shutdown` fires.
    pub async fn run(self: Arc<Self>, poll_interval: Duration, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.refresh_once().instrument(info_span!("registry_poll", netuid = self.netuid)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use valnet_primitives::ConnectionInfo;

    use crate::error::RegistryError;

    struct FlakyClient {
        fail: std::sync::atomic::AtomicBool,
    }

    #[async_trait]
    impl RegistryClient for FlakyClient {
        async fn list_modules(&self, _netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError> {
            if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
                return Err(RegistryError::Malformed("simulated outage".into()));
            }
            let connection = ConnectionInfo::parse("1.2.3.4:9001").unwrap();
            Ok(vec![
                ModuleInfo::new(0, "5Fvalidator", connection).with_rewards(0, 1)
            ])
        }
    }

    #[tokio::test]
    async fn failed_refresh_keeps_serving_the_previous_snapshot() {
        let client = Arc::new(FlakyClient {
            fail: std::sync::atomic::AtomicBool::new(false),
        });
        let cache = RegistrySnapshotCache::new(client.clone(), 7);

        cache.refresh_once().await;
        let (modules, _) = cache.current();
        assert_eq!(modules.len(), 1);

        client.fail.store(true, std::sync::atomic::Ordering::SeqCst);
        cache.refresh_once().await;
        let (modules, age) = cache.current();
        assert_eq!(modules.len(), 1);
        assert!(age < MAX_SNAPSHOT_AGE);
    }

    #[tokio::test]
    async fn absent_snapshot_is_reported_empty() {
        let client = Arc::new(FlakyClient {
            fail: std::sync::atomic::AtomicBool::new(true),
        });
        let cache = RegistrySnapshotCache::new(client, 7);
        let (modules, age) = cache.current();
        assert!(modules.is_empty());
        assert_eq!(age, Duration::MAX);
    }
}
