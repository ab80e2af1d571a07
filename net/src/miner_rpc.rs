// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::time::{Duration, Instant};

use ed25519_dalek::SigningKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;
use valnet_framing::{read_frame, write_frame};
use valnet_primitives::{MinerProcess, ModuleInfo};
use valnet_registry::RegistryClient;

use crate::signing::sign_body;

/// Default per-action timeouts (SPEC_FULL §4.8).
pub const PING_TIMEOUT: Duration = Duration::from_secs(5);
pub const CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// A one-shot request to a miner: open a TCP socket, send one signed
/// envelope, read exactly one response frame, close (SPEC_FULL §4.8). This
/// envelope shape is specific to the miner RPC protocol — it carries
/// `action`/`target_ss58_address` alongside `data`, unlike the peer-to-peer
/// `SignedEnvelope` with its closed `code` enum.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinerRequest {
    pub action: String,
    pub target_ss58_address: String,
    pub data: Value,
    pub signature_hex: String,
    pub public_key_hex: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinerResponse {
    pub action: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<MinerRpcErrorBody>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MinerRpcErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MinerRpcError {
    #[error("miner RPC timed out")]
    RpcTimeout,
    #[error("miner signature invalid")]
    RpcSignatureInvalid,
    #[error("miner returned an error: {0}")]
    RpcPeerError(String),
    #[error("transport error: {0}")]
    RpcTransport(String),
}

impl From<std::io::Error> for MinerRpcError {
    fn from(e: std::io::Error) -> Self {
        MinerRpcError::RpcTransport(e.to_string())
    }
}

impl From<valnet_framing::FrameError> for MinerRpcError {
    fn from(e: valnet_framing::FrameError) -> Self {
        MinerRpcError::RpcTransport(e.to_string())
    }
}

/// Issue one miner RPC `action` and return the outcome plus elapsed time.
/// Never returns an `Err` up to a mempool-event caller: failures are folded
/// into `MinerProcess.succeed = false` by the caller, per SPEC_FULL §4.8.
pub async fn call(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    action: &str,
    data: Value,
    call_timeout: Duration,
) -> Result<Value, MinerRpcError> {
    let started = Instant::now();
    let result = timeout(call_timeout, call_inner(signing_key, target, action, data)).await;
    match result {
        Ok(inner) => inner,
        Err(_) => {
            debug!(
                action,
                target = %target.ss58_address,
                elapsed_ms = started.elapsed().as_millis(),
                "miner RPC timed out"
            );
            Err(MinerRpcError::RpcTimeout)
        }
    }
}

async fn call_inner(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    action: &str,
    data: Value,
) -> Result<Value, MinerRpcError> {
    let addr = format!("{}:{}", target.connection.ip, target.connection.port);
    let mut socket = TcpStream::connect(&addr).await?;

    let request = build_request(signing_key, target, action, data)?;
    write_frame(&mut socket, &request).await?;

    let response: MinerResponse = read_frame(&mut socket).await?;
    if response.action != action {
        return Err(MinerRpcError::RpcTransport(format!(
            "expected action {action}, got {}",
            response.action
        )));
    }
    if let Some(error) = response.error {
        return Err(MinerRpcError::RpcPeerError(format!(
            "{}: {}",
            error.code, error.message
        )));
    }
    Ok(response.data.unwrap_or(Value::Null))
}

fn build_request(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    action: &str,
    data: Value,
) -> Result<MinerRequest, MinerRpcError> {
    use valnet_primitives::{Body, MessageCode};

    // Reuse the same canonical-signing rule as the peer-to-peer envelope: a
    // throwaway `Body` whose `data` is exactly what the request carries.
    let body = Body::new(MessageCode::Event, data.clone());
    let signature_hex = sign_body(signing_key, &body).map_err(|e| MinerRpcError::RpcTransport(e.to_string()))?;
    let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());

    Ok(MinerRequest {
        action: action.to_string(),
        target_ss58_address: target.ss58_address.clone(),
        data,
        signature_hex,
        public_key_hex,
    })
}

/// `ping`: returns `true` if the target replied within `timeout` identifying
/// itself as a miner.
pub async fn ping_is_miner(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    call_timeout: Duration,
) -> bool {
    match call(signing_key, target, "ping", json!({}), call_timeout).await {
        Ok(data) => data.get("type").and_then(Value::as_str) == Some("miner"),
        Err(_) => false,
    }
}

/// `ping`: returns `true` if the target replied within `timeout` identifying
/// itself as a validator.
pub async fn ping_is_validator(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    call_timeout: Duration,
) -> bool {
    match call(signing_key, target, "ping", json!({}), call_timeout).await {
        Ok(data) => data.get("type").and_then(Value::as_str) == Some("validator"),
        Err(_) => false,
    }
}

/// Composes the registry client with `ping` to discover which advertised
/// miners are actually reachable and self-identify as miners right now
/// (SPEC_FULL §4.8 "Active-peer discovery").
pub async fn active_miners(
    signing_key: &SigningKey,
    registry: &dyn RegistryClient,
    netuid: u16,
    ping_timeout: Duration,
) -> Result<Vec<ModuleInfo>, valnet_registry::RegistryError> {
    let miners = registry.list_miners(netuid).await?;
    let checks = miners.into_iter().map(|module| async move {
        let alive = ping_is_miner(signing_key, &module, ping_timeout).await;
        alive.then_some(module)
    });
    Ok(futures::future::join_all(checks).await.into_iter().flatten().collect())
}

/// The validator-side symmetric counterpart: active validators among the
/// registry's validator listing.
pub async fn active_validators(
    signing_key: &SigningKey,
    registry: &dyn RegistryClient,
    netuid: u16,
    ping_timeout: Duration,
) -> Result<Vec<ModuleInfo>, valnet_registry::RegistryError> {
    let validators = registry.list_validators(netuid).await?;
    let checks = validators.into_iter().map(|module| async move {
        let alive = ping_is_validator(signing_key, &module, ping_timeout).await;
        alive.then_some(module)
    });
    Ok(futures::future::join_all(checks).await.into_iter().flatten().collect())
}

/// `store`: push one chunk to `target`, returning the `chunk_uuid` it was
/// stored under (SPEC_FULL §4.8 store).
pub async fn store(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    folder: &str,
    chunk: &str,
    call_timeout: Duration,
) -> Result<Uuid, MinerRpcError> {
    use base64::Engine;
    if base64::engine::general_purpose::STANDARD.decode(chunk).is_err() {
        return Err(MinerRpcError::RpcTransport(
            "chunk is not valid base64".into(),
        ));
    }

    let data = call(
        signing_key,
        target,
        "store",
        json!({ "folder": folder, "chunk": chunk }),
        call_timeout,
    )
    .await?;
    let chunk_uuid = data
        .get("chunk_uuid")
        .and_then(Value::as_str)
        .ok_or_else(|| MinerRpcError::RpcTransport("store response missing chunk_uuid".into()))?;
    Uuid::parse_str(chunk_uuid)
        .map_err(|_| MinerRpcError::RpcTransport("store response chunk_uuid is not a UUID".into()))
}

/// `retrieve`: fetch one chunk's bytes (base64, per SPEC_FULL §3) from
/// `target`.
pub async fn retrieve(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    folder: &str,
    chunk_uuid: Uuid,
    call_timeout: Duration,
) -> Result<String, MinerRpcError> {
    let data = call(
        signing_key,
        target,
        "retrieve",
        json!({ "folder": folder, "chunk_uuid": chunk_uuid }),
        call_timeout,
    )
    .await?;
    data.get("chunk")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MinerRpcError::RpcTransport("retrieve response missing chunk".into()))
}

/// `validate`: challenge `target` to hash a chunk salted with `nonce`,
/// returning the hash it reports (SPEC_FULL §4.8 validate).
pub async fn validate(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    folder: &str,
    chunk_uuid: Uuid,
    nonce: &str,
    call_timeout: Duration,
) -> Result<String, MinerRpcError> {
    let data = call(
        signing_key,
        target,
        "validate",
        json!({ "folder": folder, "chunk_uuid": chunk_uuid, "nonce": nonce }),
        call_timeout,
    )
    .await?;
    data.get("hash")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| MinerRpcError::RpcTransport("validate response missing hash".into()))
}

/// `remove`: ask `target` to delete one chunk. No response payload is
/// expected beyond the envelope's absence of `error`.
pub async fn remove(
    signing_key: &SigningKey,
    target: &ModuleInfo,
    folder: &str,
    chunk_uuid: Uuid,
    call_timeout: Duration,
) -> Result<(), MinerRpcError> {
    call(
        signing_key,
        target,
        "remove",
        json!({ "folder": folder, "chunk_uuid": chunk_uuid }),
        call_timeout,
    )
    .await?;
    Ok(())
}

/// Runs `action` and folds its outcome into a [`MinerProcess`] regardless of
/// success or failure, so validators can log a uniform record of every
/// attempted miner interaction (SPEC_FULL §4.8, §7 event emission).
pub async fn record<F, Fut, T>(target: &ModuleInfo, chunk_uuid: Uuid, action: F) -> MinerProcess
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, MinerRpcError>>,
{
    let started = Instant::now();
    let succeed = action().await.is_ok();
    MinerProcess {
        chunk_uuid,
        miner_ss58_address: target.ss58_address.clone(),
        succeed,
        processing_time: started.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;
    use tokio::net::TcpListener;
    use valnet_primitives::ConnectionInfo;

    async fn spawn_stub_miner(respond: MinerResponse) -> ModuleInfo {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let _request: MinerRequest = read_frame(&mut socket).await.unwrap();
            write_frame(&mut socket, &respond).await.unwrap();
        });
        ModuleInfo::new(0, "5Fstub", ConnectionInfo::new("127.0.0.1", port))
    }

    #[tokio::test]
    async fn store_parses_the_chunk_uuid_from_the_response() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let chunk_uuid = Uuid::new_v4();
        let target = spawn_stub_miner(MinerResponse {
            action: "store".into(),
            data: Some(json!({ "chunk_uuid": chunk_uuid.to_string() })),
            error: None,
        })
        .await;

        let got = store(&signing_key, &target, "folder", "chunk-bytes", Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(got, chunk_uuid);
    }

    #[tokio::test]
    async fn peer_error_response_surfaces_as_rpc_peer_error() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let target = spawn_stub_miner(MinerResponse {
            action: "remove".into(),
            data: None,
            error: Some(MinerRpcErrorBody {
                code: "not_found".into(),
                message: "no such chunk".into(),
            }),
        })
        .await;

        let err = remove(&signing_key, &target, "folder", Uuid::new_v4(), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, MinerRpcError::RpcPeerError(_)));
    }

    #[tokio::test]
    async fn call_times_out_against_an_unresponsive_peer() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let target = ModuleInfo::new(0, "5Fstub", ConnectionInfo::new("127.0.0.1", port));

        let err = call(&signing_key, &target, "ping", json!({}), Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, MinerRpcError::RpcTimeout));
    }

    #[tokio::test]
    async fn record_captures_failure_without_propagating_the_error() {
        let target = ModuleInfo::new(
            0,
            "5Fstub",
            ConnectionInfo::new("127.0.0.1", 1),
        );
        let chunk_uuid = Uuid::new_v4();
        let process = record(&target, chunk_uuid, || async {
            Err::<(), _>(MinerRpcError::RpcTimeout)
        })
        .await;
        assert!(!process.succeed);
        assert_eq!(process.chunk_uuid, chunk_uuid);
    }
}
