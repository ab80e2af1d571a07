// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("connection pool is at capacity ({0})")]
    Full(usize),
}
