// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Validator peer-to-peer networking (SPEC_FULL §4): inbound admission,
//! outbound reconciliation, liveness, and the miner RPC client, all built on
//! [`valnet_framing`]'s length-prefixed envelopes over the identities and
//! event types defined in [`valnet_primitives`].

mod config;
mod connector;
mod db;
mod error;
mod liveness;
mod miner_rpc;
mod receiver;
mod server;
mod signing;
mod state;

pub use config::NetConfig;
pub use connector::run_reconcile_loop;
pub use db::DbCollaborator;
pub use error::NetError;
pub use liveness::{run_pinger, run_reaper};
pub use miner_rpc::{
    active_miners, active_validators, call, ping_is_miner, ping_is_validator, record, remove,
    retrieve, store, validate, MinerRequest, MinerResponse, MinerRpcError, MinerRpcErrorBody,
    CALL_TIMEOUT, PING_TIMEOUT,
};
pub use server::run_accept_loop;
pub use signing::{build_identifier, seal, sign_body, verify_envelope, verify_event_signature};
pub use state::{NetState, PeerHandle};
