// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::collections::BTreeMap;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use serde::Deserialize;
use tracing::debug;
use valnet_primitives::{ConnectionInfo, ModuleInfo, Role};

use crate::error::RegistryError;

/// A read-only view onto the chain's module registry for one subnet.
///
/// Implementations only need `list_modules`; `list_validators`/`list_miners`
/// are derived from it the same way `smartdrive.commune.request.get_miners`
/// and `get_active_validators` are derived from `get_modules` — by filtering
/// the same list rather than issuing a separate query.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn list_modules(&self, netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError>;

    async fn list_validators(&self, netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError> {
        Ok(self
            .list_modules(netuid)
            .await?
            .into_iter()
            .filter(|m| m.role() == Role::Validator)
            .collect())
    }

    async fn list_miners(&self, netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError> {
        Ok(self
            .list_modules(netuid)
            .await?
            .into_iter()
            .filter(|m| m.role() == Role::Miner)
            .collect())
    }
}

/// Raw shape of a `SubspaceModule` batched-map query, joined by UID on our
/// side exactly as `get_modules` joins `keys_map`/`address_map`/the reward
/// maps in the original implementation.
#[derive(Debug, Deserialize)]
struct BatchMapResponse {
    keys: BTreeMap<u64, String>,
    address: BTreeMap<u64, String>,
    #[serde(default)]
    incentive: BTreeMap<u64, u64>,
    #[serde(default)]
    dividends: BTreeMap<u64, u64>,
}

/// [`RegistryClient`] backed by a JSON-RPC chain node, queried with a single
/// batched call per [`RegistryClient::list_modules`] invocation.
pub struct RpcRegistryClient {
    http: HttpClient,
}

impl RpcRegistryClient {
    pub fn new(rpc_url: &str) -> Result<Self, RegistryError> {
        let http = HttpClientBuilder::default()
            .build(rpc_url)
            .map_err(RegistryError::Rpc)?;
        Ok(Self { http })
    }
}

#[async_trait]
impl RegistryClient for RpcRegistryClient {
    async fn list_modules(&self, netuid: u16) -> Result<Vec<ModuleInfo>, RegistryError> {
        let response: BatchMapResponse = self
            .http
            .request("subspaceModule_queryBatchMap", rpc_params![netuid])
            .await?;

        let mut modules = Vec::with_capacity(response.keys.len());
        for (uid, ss58_address) in &response.keys {
            let Some(address) = response.address.get(uid) else {
                continue;
            };
            let Some(connection) = ConnectionInfo::parse(address) else {
                debug!(uid, address, "dropping module with unparseable address");
                continue;
            };

            let incentive = response.incentive.get(uid).copied();
            let dividends = response.dividends.get(uid).copied();
            let mut module = ModuleInfo::new(*uid, ss58_address.clone(), connection);
            if let (Some(incentive), Some(dividends)) = (incentive, dividends) {
                module = module.with_rewards(incentive, dividends);
            }
            modules.push(module);
        }
        Ok(modules)
    }
}
