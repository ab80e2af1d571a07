// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("chain RPC call failed: {0}")]
    Rpc(#[from] jsonrpsee::core::ClientError),
    #[error("registry response missing `{0}` map")]
    MissingField(&'static str),
    #[error("registry response shape mismatch: {0}")]
    Malformed(String),
}
