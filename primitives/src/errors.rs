// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Errors arising from the shared data model: identity derivation, address
/// parsing and the signed envelope's own structural checks.
#[derive(Debug, Error)]
pub enum Error {
    #[error("public key has the wrong length for ed25519 ({0} bytes)")]
    InvalidPublicKeyLength(usize),
    #[error("invalid hex in {field}: {source}")]
    InvalidHex {
        field: &'static str,
        #[source]
        source: hex::FromHexError,
    },
    #[error("invalid base58 ss58 address")]
    InvalidSs58,
    #[error("ss58 checksum mismatch")]
    Ss58ChecksumMismatch,
    #[error("{0}")]
    Other(String),
}
