// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use valnet_framing::write_frame;
use valnet_primitives::{Body, MessageCode};

use crate::signing::seal;
use crate::state::NetState;

/// Pings every pooled peer every `ping_interval`. Sends are best-effort: a
/// failed send is logged and left for the reaper's inactivity sweep to
/// clean up, never treated as fatal on its own (SPEC_FULL §4.7).
pub async fn run_pinger(state: Arc<NetState>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(state.config.ping_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => ping_all(&state).instrument(info_span!("pinger")).await,
        }
    }
}

async fn ping_all(state: &Arc<NetState>) {
    for identifier in state.pool.identifiers() {
        let Some(connection) = state.pool.get_active(&identifier) else {
            continue;
        };
        let nonce = Uuid::new_v4().to_string();
        let envelope = match seal(&state.signing_key, Body::new(MessageCode::Ping, json!({ "nonce": nonce }))) {
            Ok(envelope) => envelope,
            Err(err) => {
                debug!(ss58_address = %identifier, error = %err, "failed to seal PING");
                continue;
            }
        };

        let mut writer = connection.socket.writer.lock().await;
        if let Err(err) = write_frame(&mut *writer, &envelope).await {
            debug!(ss58_address = %identifier, error = %err, "PING send failed, leaving to the reaper");
        }
    }
}

/// Removes and closes every peer whose last ping is older than
/// `inactivity_timeout`, on the same cadence as the pinger.
pub async fn run_reaper(state: Arc<NetState>, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(state.config.ping_interval);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                let reaped = state.pool.reap_inactive();
                if !reaped.is_empty() {
                    info!(count = reaped.len(), "reaped inactive peers");
                }
                for handle in reaped {
                    handle.close().await;
                }
            }
        }
    }
}
