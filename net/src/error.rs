// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetError {
    #[error(transparent)]
    Frame(#[from] valnet_framing::FrameError),
    #[error("signature verification failed")]
    SignatureInvalid,
    #[error(transparent)]
    Primitive(#[from] valnet_primitives::Error),
    #[error("claimed ss58_address does not match the key that signed this envelope")]
    IdentityMismatch,
    #[error("peer is not a known validator")]
    NotInSnapshot,
    #[error(transparent)]
    Pool(#[from] valnet_pool::PoolError),
    #[error("timed out waiting for {0}")]
    Timeout(&'static str),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Other(String),
}
