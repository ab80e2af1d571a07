// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Length-prefixed JSON framing shared by peer-to-peer sockets and the
//! miner RPC client: a 4-byte big-endian length header followed by exactly
//! that many bytes of [`valnet_primitives::SignedEnvelope`] JSON.

mod codec;
mod error;

pub use codec::{read_frame, write_frame, MAX_FRAME_BYTES};
pub use error::FrameError;
