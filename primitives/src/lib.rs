// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Shared data model for the validator peer-to-peer networking core.
//!
//! This crate has no knowledge of sockets, locks or chain queries — it only
//! fixes the shapes that cross those boundaries: identities, module/connection
//! metadata, the signed wire envelope, and mempool events.

pub mod envelope;
pub mod errors;
pub mod event;
mod hexutil;
pub mod identity;
pub mod module;

pub use envelope::{Body, MessageCode, SignedEnvelope};
pub use errors::Error;
pub use event::{Event, EventKind, MinerProcess};
pub use identity::{
    public_key_from_ss58, ss58_from_public_key, ss58_from_public_key_hex, validate_ss58,
    ConnectionInfo,
};
pub use module::{classify_role, ModuleInfo, Role};
