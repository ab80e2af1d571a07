// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

mod config;
mod error;
mod key;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use config::Config;
use valnet_net::{run_accept_loop, run_pinger, run_reaper, run_reconcile_loop, NetState};
use valnet_registry::{RegistrySnapshotCache, RpcRegistryClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Validator peer-mesh networking daemon")]
struct Args {
    /// Path to a TOML configuration file. Missing is not an error: every
    /// field falls back to its default.
    #[arg(long, default_value = "valnet.toml")]
    config: PathBuf,

    /// Override `netuid` from the config file.
    #[arg(long)]
    netuid: Option<u16>,

    /// Override `bind_address` from the config file.
    #[arg(long)]
    bind_address: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::setup();
    let args = Args::parse();

    let mut config = Config::load(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config.display()))?;
    if let Some(netuid) = args.netuid {
        config.netuid = netuid;
    }
    if let Some(bind_address) = args.bind_address {
        config.bind_address = bind_address;
    }

    let signing_key = key::load_or_generate(&config.key_path)
        .with_context(|| format!("loading signing key from {}", config.key_path.display()))?;

    run(config, signing_key).await
}

async fn run(config: Config, signing_key: ed25519_dalek::SigningKey) -> anyhow::Result<()> {
    let registry_client = RpcRegistryClient::new(&config.rpc_url)
        .context("constructing the chain RPC client")?;
    let registry = Arc::new(RegistrySnapshotCache::new(
        Arc::new(registry_client),
        config.netuid,
    ));
    // Seed one listing synchronously so the accept loop's first handshakes
    // aren't rejected as NotInSnapshot before the poller's first tick.
    registry.refresh_once().await;

    let state = NetState::new(config.net_config(), signing_key, registry.clone());
    info!(ss58_address = %state.local_ss58_address, netuid = config.netuid, "starting validator-net");

    let shutdown = CancellationToken::new();
    let registry_poll_interval = Duration::from_secs(config.registry_poll_interval_s);

    let mut workers: tokio::task::JoinSet<anyhow::Result<()>> = tokio::task::JoinSet::new();
    workers.spawn({
        let state = state.clone();
        let shutdown = shutdown.clone();
        async move { run_accept_loop(state, shutdown).await.map_err(anyhow::Error::from) }
    });
    workers.spawn({
        let state = state.clone();
        let shutdown = shutdown.clone();
        async move {
            run_reconcile_loop(state, shutdown).await;
            Ok(())
        }
    });
    workers.spawn({
        let state = state.clone();
        let shutdown = shutdown.clone();
        async move {
            run_pinger(state, shutdown).await;
            Ok(())
        }
    });
    workers.spawn({
        let state = state.clone();
        let shutdown = shutdown.clone();
        async move {
            run_reaper(state, shutdown).await;
            Ok(())
        }
    });
    workers.spawn({
        let registry = registry.clone();
        let shutdown = shutdown.clone();
        async move {
            registry.run(registry_poll_interval, shutdown).await;
            Ok(())
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("waiting for ctrl-c")?;
    info!("shutdown signal received, stopping workers");
    shutdown.cancel();

    let hard_deadline = Duration::from_secs(2);
    if tokio::time::timeout(hard_deadline, async {
        while workers.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        tracing::warn!("workers did not shut down within the deadline, exiting anyway");
    }

    Ok(())
}
