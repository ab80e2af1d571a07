// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::HashSet;
use std::sync::Arc;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use valnet_framing::write_frame;
use valnet_primitives::ModuleInfo;

use crate::error::NetError;
use crate::receiver::spawn_receiver;
use crate::signing::build_identifier;
use crate::state::{NetState, PeerHandle};

/// Periodic reconciliation: align the pool with the current validator
/// snapshot every `reconcile_interval` (SPEC_FULL §4.5).
pub async fn run_reconcile_loop(state: Arc<NetState>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(state.config.reconcile_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                reconcile_once(&state, &shutdown).instrument(info_span!("reconcile")).await;
            }
        }
    }
}

async fn reconcile_once(state: &Arc<NetState>, shutdown: &CancellationToken) {
    let (validators, age) = state.registry.current();
    let active: HashSet<String> = validators
        .iter()
        .map(|m| m.ss58_address.clone())
        .filter(|addr| addr != &state.local_ss58_address)
        .collect();

    let current: HashSet<String> = state.pool.identifiers().into_iter().collect();

    let stale: Vec<String> = current.difference(&active).cloned().collect();
    if !stale.is_empty() {
        for handle in state.pool.remove_many(&stale) {
            handle.close().await;
        }
    }

    let missing: Vec<ModuleInfo> = validators
        .into_iter()
        .filter(|m| m.ss58_address != state.local_ss58_address && !current.contains(&m.ss58_address))
        .collect();

    let connect_timeout = state.config.connect_timeout;
    let attempts = missing.into_iter().map(|module| {
        let state = state.clone();
        let shutdown = shutdown.clone();
        async move {
            let ss58_address = module.ss58_address.clone();
            match timeout(connect_timeout, connect_to(state, module, shutdown)).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(%ss58_address, error = %err, "outbound connect failed"),
                Err(_) => warn!(%ss58_address, "outbound connect timed out"),
            }
        }
    });
    futures::future::join_all(attempts).await;

    info!(
        connected = state.pool.len(),
        validators = active.len(),
        snapshot_age_secs = age.as_secs(),
        "reconciliation tick"
    );
}

async fn connect_to(
    state: Arc<NetState>,
    module: ModuleInfo,
    shutdown: CancellationToken,
) -> Result<(), NetError> {
    let ss58_address = module.ss58_address.clone();

    // Tie-break (SPEC_FULL §4.5): when both sides race to connect to each
    // other, only the lexicographically smaller address is allowed to win
    // by overwriting an existing admission; the larger side leaves whatever
    // is already there (its own earlier outbound, or the peer's inbound)
    // alone rather than dial a connection it would immediately replace.
    if state.local_ss58_address > ss58_address && state.pool.get(&ss58_address).is_some() {
        return Ok(());
    }

    let addr = format!("{}:{}", module.connection.ip, module.connection.port);
    let mut socket = TcpStream::connect(&addr).await?;

    let envelope = build_identifier(&state.signing_key, &state.local_ss58_address)?;
    write_frame(&mut socket, &envelope).await?;

    let (read_half, write_half) = socket.into_split();
    let handle = PeerHandle::new(write_half);
    let peer_cancel = handle.cancel.clone();

    // `upsert` is the first point any of this becomes visible to other
    // workers; a failure here means nothing was half-inserted and both
    // halves are simply dropped when this function returns. A replaced
    // entry's socket is closed here, after the pool's lock is released.
    if let Some(previous) = state.pool.upsert(ss58_address.clone(), module, handle)? {
        previous.close().await;
    }

    info!(%ss58_address, "peer admitted (outbound)");
    spawn_receiver(state, ss58_address, read_half, peer_cancel, shutdown);
    Ok(())
}
