// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Chain registry access: a [`RegistryClient`] trait over the subnet's
//! module listing, and a [`RegistrySnapshotCache`] that polls it and serves
//! validators and the connection pool a never-erroring, always-available
//! view of the network.

mod client;
mod error;
mod snapshot;

pub use client::{RegistryClient, RpcRegistryClient};
pub use error::RegistryError;
pub use snapshot::{RegistrySnapshotCache, MAX_SNAPSHOT_AGE};
