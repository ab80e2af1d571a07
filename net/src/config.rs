// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::Duration;

/// Tunables for the networking core (SPEC_FULL §6/§11). The daemon's on-disk
/// `Config` maps onto this one-to-one; kept separate so this crate has no
/// dependency on `toml`/`clap`.
#[derive(Clone, Debug)]
pub struct NetConfig {
    pub bind_address: String,
    pub port: u16,
    pub netuid: u16,
    pub max_connections: usize,
    pub ping_interval: Duration,
    pub inactivity_timeout: Duration,
    pub reconcile_interval: Duration,
    pub identifier_timeout: Duration,
    pub connect_timeout: Duration,
    pub mempool_capacity: usize,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 9001,
            netuid: 0,
            max_connections: 64,
            ping_interval: Duration::from_secs(5),
            inactivity_timeout: Duration::from_secs(10),
            reconcile_interval: Duration::from_secs(10),
            identifier_timeout: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(5),
            mempool_capacity: valnet_mempool::DEFAULT_CAPACITY,
        }
    }
}
