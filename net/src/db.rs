// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use async_trait::async_trait;

use crate::error::NetError;

/// The local event/chunk-ownership database, out of scope for this crate
/// (SPEC_FULL §1 lists it as an external collaborator) but still given a
/// real interface here, the same way [`valnet_registry::RegistryClient`]
/// gives the chain query a trait boundary this crate never implements
/// itself.
///
/// `DB_SYNC_REQUEST`/`DB_SYNC_RESPONSE` (§4.6) only make sense once some
/// concrete database is wired in through [`crate::NetState`]; without one,
/// the receiver logs and drops the frame rather than pretend to have
/// handled it.
#[async_trait]
pub trait DbCollaborator: Send + Sync {
    /// A handle (path, URL, or content id) for the current database export
    /// artifact, to be carried in a `DB_SYNC_RESPONSE`.
    async fn export_handle(&self) -> Result<String, NetError>;

    /// Import a database export previously obtained from a peer's
    /// `export_handle`.
    async fn import(&self, handle: &str) -> Result<(), NetError>;
}
