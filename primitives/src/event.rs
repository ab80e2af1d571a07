// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// The four operations a signed event can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Store,
    Retrieve,
    Validate,
    Remove,
}

/// The outcome of one miner's participation in an event, kept for audit and
/// surfaced to callers of the miner RPC client as `succeed`/`processing_time`
/// even on failure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MinerProcess {
    pub chunk_uuid: Uuid,
    pub miner_ss58_address: String,
    pub succeed: bool,
    pub processing_time: f64,
}

impl MinerProcess {
    pub fn new(chunk_uuid: Uuid, miner_ss58_address: impl Into<String>) -> Self {
        Self {
            chunk_uuid,
            miner_ss58_address: miner_ss58_address.into(),
            succeed: false,
            processing_time: 0.0,
        }
    }
}

/// A signed event admitted to the mempool. Immutable once constructed;
/// `event_params`/`event_signed_params` and `input_params`/`input_signed_params`
/// are kept as opaque JSON since their shape is kind-specific and owned by
/// collaborators outside the networking core (the user API and the DB layer).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub uuid: Uuid,
    pub validator_ss58_address: String,
    pub event_params: Value,
    pub event_signed_params: String,
    pub user_ss58_address: String,
    pub input_params: Value,
    pub input_signed_params: String,
    pub kind: EventKind,
}

impl Event {
    /// Bytes the `event_signed_params` signature was taken over: the
    /// canonical (sorted-key, no-whitespace) serialization of `event_params`,
    /// the same rule the wire envelope uses for `body` (SPEC_FULL §9).
    pub fn signed_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(&self.event_params)
    }
}
