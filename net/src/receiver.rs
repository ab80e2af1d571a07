// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;

use serde_json::Value;
use tokio::net::tcp::OwnedReadHalf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use valnet_framing::{read_frame, write_frame};
use valnet_mempool::InsertOutcome;
use valnet_primitives::{Body, Event, MessageCode, SignedEnvelope};

use crate::error::NetError;
use crate::signing::{seal, verify_envelope, verify_event_signature};
use crate::state::NetState;

/// Spawn the read loop for one admitted peer. Terminal actions always remove
/// the peer from the pool and shut its socket down exactly once, on every
/// exit path — including eviction requested by another worker through
/// `peer_close` (reconciliation's stale removal, the reaper).
pub fn spawn_receiver(
    state: Arc<NetState>,
    peer_id: String,
    mut read_half: OwnedReadHalf,
    peer_close: CancellationToken,
    shutdown: CancellationToken,
) {
    tokio::spawn(
        async move {
            receive_loop(&state, &peer_id, &mut read_half, &peer_close, &shutdown).await;
            // If another worker already evicted us, the pool entry (and the
            // responsibility to close it) is already gone; this is a no-op.
            if let Some(handle) = state.pool.remove(&peer_id) {
                handle.close().await;
            }
            info!("peer removed");
        }
        .instrument(info_span!("receiver", ss58_address = %peer_id)),
    );
}

async fn receive_loop(
    state: &Arc<NetState>,
    peer_id: &str,
    read_half: &mut OwnedReadHalf,
    peer_close: &CancellationToken,
    shutdown: &CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = peer_close.cancelled() => {
                debug!("closing: evicted by another worker");
                return;
            }
            frame = read_frame::<SignedEnvelope, _>(read_half) => {
                let envelope = match frame {
                    Ok(envelope) => envelope,
                    Err(err) => {
                        debug!(error = %err, "closing: frame error");
                        return;
                    }
                };

                if let Err(err) = verify_envelope(&envelope) {
                    warn!(error = %err, "closing: signature invalid");
                    return;
                }
                state.pool.touch(peer_id);

                if let Err(err) = dispatch(state, peer_id, &envelope).await {
                    debug!(error = %err, "dispatch error, continuing");
                }
            }
        }
    }
}

async fn dispatch(
    state: &Arc<NetState>,
    peer_id: &str,
    envelope: &SignedEnvelope,
) -> Result<(), NetError> {
    match envelope.body.code {
        MessageCode::Ping => reply_pong(state, peer_id, &envelope.body.data).await,
        MessageCode::Pong => {
            debug!("pong received");
            Ok(())
        }
        MessageCode::Event | MessageCode::EventBatch => {
            ingest_events(state, envelope.body.code, &envelope.body.data)
        }
        MessageCode::DbSyncRequest => reply_db_sync(state, peer_id).await,
        MessageCode::DbSyncResponse => ingest_db_sync(state, &envelope.body.data).await,
        MessageCode::Identifier => {
            debug!("unexpected IDENTIFIER after handshake, ignoring");
            Ok(())
        }
        MessageCode::Unknown => {
            warn!("unrecognized message code, dropping frame");
            Ok(())
        }
    }
}

async fn reply_pong(state: &Arc<NetState>, peer_id: &str, nonce: &Value) -> Result<(), NetError> {
    let Some(connection) = state.pool.get(peer_id) else {
        return Ok(());
    };
    let reply = seal(&state.signing_key, Body::new(MessageCode::Pong, nonce.clone()))?;
    let mut writer = connection.socket.writer.lock().await;
    write_frame(&mut *writer, &reply).await?;
    Ok(())
}

/// Respond to a `DB_SYNC_REQUEST` with the current export artifact handle
/// (SPEC_FULL §4.6). With no [`crate::db::DbCollaborator`] wired in, there is
/// nothing to export; the request is logged and dropped rather than
/// answered with a made-up handle.
async fn reply_db_sync(state: &Arc<NetState>, peer_id: &str) -> Result<(), NetError> {
    let Some(db) = &state.db else {
        debug!("db sync request received, no db collaborator configured, dropping");
        return Ok(());
    };
    let Some(connection) = state.pool.get(peer_id) else {
        return Ok(());
    };

    let handle = db.export_handle().await?;
    let reply = seal(
        &state.signing_key,
        Body::new(MessageCode::DbSyncResponse, serde_json::json!({ "handle": handle })),
    )?;
    let mut writer = connection.socket.writer.lock().await;
    write_frame(&mut *writer, &reply).await?;
    Ok(())
}

/// Hand a `DB_SYNC_RESPONSE`'s export handle off to the configured
/// [`crate::db::DbCollaborator`] for import; dropped if none is configured.
async fn ingest_db_sync(state: &Arc<NetState>, data: &Value) -> Result<(), NetError> {
    let Some(db) = &state.db else {
        debug!("db sync response received, no db collaborator configured, dropping");
        return Ok(());
    };
    let Some(handle) = data.get("handle").and_then(Value::as_str) else {
        warn!("db sync response missing handle, dropping");
        return Ok(());
    };
    db.import(handle).await
}

fn extract_events(code: MessageCode, data: &Value) -> Result<Vec<Event>, NetError> {
    match code {
        MessageCode::Event => {
            let event: Event =
                serde_json::from_value(data.clone()).map_err(|e| NetError::Other(e.to_string()))?;
            Ok(vec![event])
        }
        MessageCode::EventBatch => match data.get("events") {
            Some(events) => serde_json::from_value(events.clone())
                .map_err(|e| NetError::Other(e.to_string())),
            None => Ok(Vec::new()),
        },
        _ => Ok(Vec::new()),
    }
}

fn ingest_events(state: &Arc<NetState>, code: MessageCode, data: &Value) -> Result<(), NetError> {
    for event in extract_events(code, data)? {
        match verify_event_signature(
            &event.validator_ss58_address,
            &event.event_params,
            &event.event_signed_params,
        ) {
            Ok(true) => match state.mempool.insert(event) {
                InsertOutcome::Inserted => {}
                InsertOutcome::Duplicate => {}
            },
            Ok(false) | Err(_) => {
                warn!(uuid = %event.uuid, "dropping event with invalid signature");
            }
        }
    }
    Ok(())
}
