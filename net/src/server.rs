// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use valnet_framing::read_frame;
use valnet_primitives::{MessageCode, SignedEnvelope};

use crate::error::NetError;
use crate::receiver::spawn_receiver;
use crate::signing::verify_envelope;
use crate::state::{NetState, PeerHandle};

/// Binds `config.bind_address:config.port` and admits peers per the
/// handshake in SPEC_FULL §4.4, spawning a [`crate::receiver`] for each.
pub async fn run_accept_loop(state: Arc<NetState>, shutdown: CancellationToken) -> Result<(), NetError> {
    let addr = format!("{}:{}", state.config.bind_address, state.config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening for inbound peer connections");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("accept loop shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (socket, peer_addr) = accepted?;
                let state = state.clone();
                let shutdown = shutdown.clone();
                tokio::spawn(
                    async move {
                        if let Err(err) = handle_inbound(state, socket, shutdown).await {
                            debug!(error = %err, "inbound handshake rejected");
                        }
                    }
                    .instrument(info_span!("inbound", %peer_addr)),
                );
            }
        }
    }
}

async fn handle_inbound(
    state: Arc<NetState>,
    mut socket: TcpStream,
    shutdown: CancellationToken,
) -> Result<(), NetError> {
    let envelope: SignedEnvelope = timeout(
        state.config.identifier_timeout,
        read_frame(&mut socket),
    )
    .await
    .map_err(|_| NetError::Timeout("IDENTIFIER frame"))??;

    if envelope.body.code != MessageCode::Identifier {
        return Err(NetError::Other(
            "first frame on an inbound socket was not IDENTIFIER".into(),
        ));
    }
    let claimed_ss58_address = envelope
        .body
        .data
        .get("ss58_address")
        .and_then(|v| v.as_str())
        .ok_or_else(|| NetError::Other("IDENTIFIER missing data.ss58_address".into()))?
        .to_string();

    verify_envelope(&envelope)?;
    let derived_ss58_address = envelope.derived_ss58_address()?;
    if claimed_ss58_address != derived_ss58_address {
        return Err(NetError::IdentityMismatch);
    }
    if derived_ss58_address == state.local_ss58_address {
        return Err(NetError::Other("refusing to admit ourselves".into()));
    }

    if state.pool.get(&derived_ss58_address).is_some() {
        debug!(ss58_address = %derived_ss58_address, "duplicate inbound connection, closing");
        return Ok(());
    }

    let (validators, _age) = state.registry.current();
    let module = validators
        .into_iter()
        .find(|m| m.ss58_address == derived_ss58_address)
        .ok_or(NetError::NotInSnapshot)?;

    let (read_half, write_half) = socket.into_split();
    let handle = PeerHandle::new(write_half);
    let peer_cancel = handle.cancel.clone();

    match state
        .pool
        .upsert(derived_ss58_address.clone(), module, handle)
    {
        Ok(_) => {}
        Err(err) => {
            warn!(ss58_address = %derived_ss58_address, error = %err, "rejecting inbound peer");
            return Ok(());
        }
    }

    info!(ss58_address = %derived_ss58_address, "peer admitted");
    spawn_receiver(state, derived_ss58_address, read_half, peer_cancel, shutdown);
    Ok(())
}
