// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use valnet_framing::write_frame;
use valnet_net::{
    build_identifier, run_accept_loop, run_reconcile_loop, seal, NetConfig, NetState,
};
use valnet_primitives::{
    Body, ConnectionInfo, Event, EventKind, MessageCode, ModuleInfo, SignedEnvelope,
};
use valnet_registry::{RegistryClient, RegistryError, RegistrySnapshotCache};

/// A fixed module listing, standing in for a live chain query — the same
/// role `MpoolRpcProvider`'s test double plays for the message pool's tests.
struct InMemoryRegistry {
    modules: Vec<ModuleInfo>,
}

#[async_trait]
impl RegistryClient for InMemoryRegistry {
    async fn list_modules(&self, _netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError> {
        Ok(self.modules.clone())
    }
}

async fn ephemeral_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

fn validator_module(port: u16, signing_key: &SigningKey) -> ModuleInfo {
    let ss58 = valnet_primitives::ss58_from_public_key(&signing_key.verifying_key().to_bytes());
    ModuleInfo::new(0, ss58, ConnectionInfo::new("127.0.0.1", port)).with_rewards(0, 1)
}

async fn node(port: u16, modules: Vec<ModuleInfo>) -> (Arc<NetState>, SigningKey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let registry = Arc::new(RegistrySnapshotCache::new(
        Arc::new(InMemoryRegistry { modules }),
        0,
    ));
    registry.refresh_once().await;

    let mut config = NetConfig::default();
    config.bind_address = "127.0.0.1".to_string();
    config.port = port;
    config.reconcile_interval = Duration::from_millis(30);
    config.ping_interval = Duration::from_millis(200);

    let state = NetState::new(config, signing_key.clone(), registry);
    (state, signing_key)
}

#[tokio::test]
async fn inbound_handshake_admits_a_known_validator() {
    let port_b = ephemeral_port().await;

    let key_a = SigningKey::generate(&mut OsRng);
    let (state_b, key_b) = node(port_b, vec![]).await;
    let module_a = validator_module(0, &key_a);
    let module_b = validator_module(port_b, &key_b);
    // B's registry must know about A for the handshake's snapshot check to pass.
    let registry_b = Arc::new(RegistrySnapshotCache::new(
        Arc::new(InMemoryRegistry {
            modules: vec![module_a.clone(), module_b],
        }),
        0,
    ));
    registry_b.refresh_once().await;
    let state_b = NetState::new(state_b.config.clone(), key_b, registry_b);

    let shutdown = CancellationToken::new();
    tokio::spawn(run_accept_loop(state_b.clone(), shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let local_a = valnet_primitives::ss58_from_public_key(&key_a.verifying_key().to_bytes());
    let mut socket = TcpStream::connect(("127.0.0.1", port_b)).await.unwrap();
    let identifier = build_identifier(&key_a, &local_a).unwrap();
    write_frame(&mut socket, &identifier).await.unwrap();

    // Give the accept loop's handshake time to run and admit the peer.
    for _ in 0..20 {
        if state_b.pool.get(&local_a).is_some() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(state_b.pool.get(&local_a).is_some(), "peer A was not admitted");

    shutdown.cancel();
}

#[tokio::test]
async fn reconciliation_converges_a_two_validator_mesh() {
    let port_a = ephemeral_port().await;
    let port_b = ephemeral_port().await;

    let (state_a, key_a) = node(port_a, vec![]).await;
    let (state_b, key_b) = node(port_b, vec![]).await;

    let module_a = validator_module(port_a, &key_a);
    let module_b = validator_module(port_b, &key_b);

    let registry_both = vec![module_a, module_b];
    let registry_a = Arc::new(RegistrySnapshotCache::new(
        Arc::new(InMemoryRegistry {
            modules: registry_both.clone(),
        }),
        0,
    ));
    registry_a.refresh_once().await;
    let registry_b = Arc::new(RegistrySnapshotCache::new(
        Arc::new(InMemoryRegistry {
            modules: registry_both,
        }),
        0,
    ));
    registry_b.refresh_once().await;

    let state_a = NetState::new(state_a.config.clone(), key_a.clone(), registry_a);
    let state_b = NetState::new(state_b.config.clone(), key_b.clone(), registry_b);

    let shutdown = CancellationToken::new();
    tokio::spawn(run_accept_loop(state_a.clone(), shutdown.clone()));
    tokio::spawn(run_accept_loop(state_b.clone(), shutdown.clone()));
    tokio::spawn(run_reconcile_loop(state_a.clone(), shutdown.clone()));
    tokio::spawn(run_reconcile_loop(state_b.clone(), shutdown.clone()));

    let local_a = valnet_primitives::ss58_from_public_key(&key_a.verifying_key().to_bytes());
    let local_b = valnet_primitives::ss58_from_public_key(&key_b.verifying_key().to_bytes());

    let mut converged = false;
    for _ in 0..50 {
        if state_a.pool.get(&local_b).is_some() && state_b.pool.get(&local_a).is_some() {
            converged = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(converged, "the two validators never converged into a mesh");

    shutdown.cancel();
}

#[tokio::test]
async fn a_signed_event_sent_over_an_admitted_connection_lands_in_the_peers_mempool() {
    let port_b = ephemeral_port().await;
    let key_a = SigningKey::generate(&mut OsRng);
    let (base_b, key_b) = node(port_b, vec![]).await;

    let module_a = validator_module(0, &key_a);
    let module_b = validator_module(port_b, &key_b);
    let registry_b = Arc::new(RegistrySnapshotCache::new(
        Arc::new(InMemoryRegistry {
            modules: vec![module_a, module_b],
        }),
        0,
    ));
    registry_b.refresh_once().await;
    let state_b = NetState::new(base_b.config.clone(), key_b, registry_b);

    let shutdown = CancellationToken::new();
    tokio::spawn(run_accept_loop(state_b.clone(), shutdown.clone()));
    tokio::time::sleep(Duration::from_millis(50)).await;

    let local_a = valnet_primitives::ss58_from_public_key(&key_a.verifying_key().to_bytes());
    let mut socket = TcpStream::connect(("127.0.0.1", port_b)).await.unwrap();
    let identifier = build_identifier(&key_a, &local_a).unwrap();
    write_frame(&mut socket, &identifier).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let event_params = serde_json::json!({"folder": local_a, "chunk_uuid": uuid::Uuid::new_v4()});
    let signed_bytes = serde_json::to_vec(&event_params).unwrap();
    use ed25519_dalek::Signer;
    let signature_hex = hex::encode(key_a.sign(&signed_bytes).to_bytes());

    let event = Event {
        uuid: uuid::Uuid::new_v4(),
        validator_ss58_address: local_a.clone(),
        event_params,
        event_signed_params: signature_hex,
        user_ss58_address: "5Fuser".to_string(),
        input_params: serde_json::json!({}),
        input_signed_params: "deadbeef".to_string(),
        kind: EventKind::Store,
    };
    let envelope: SignedEnvelope = seal(
        &key_a,
        Body::new(MessageCode::Event, serde_json::to_value(&event).unwrap()),
    )
    .unwrap();
    write_frame(&mut socket, &envelope).await.unwrap();

    let mut landed = false;
    for _ in 0..20 {
        if state_b.mempool.contains(&event.uuid) {
            landed = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(landed, "event never reached the peer's mempool");

    drop(socket);
    shutdown.cancel();
}
