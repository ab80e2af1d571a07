// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Every way a frame can fail to arrive in one piece. All variants collapse
/// to "close this socket" at the call site (SPEC_FULL §7): transient I/O and
/// protocol violations are distinguished only for logging.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame length {0} exceeds the {1} byte cap")]
    TooLarge(u32, usize),
    #[error("connection closed before a full frame was read")]
    Eof,
    #[error("frame body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
    #[error("frame body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
