// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Ported from `smartdrive.validator.utils`: strip an optional `0x` prefix
//! and lowercase, the normalization every `signature_hex`/`public_key_hex`
//! comparison and decode goes through before touching `hex::decode`.

pub(crate) fn normalize_hex(s: &str) -> String {
    s.strip_prefix("0x").unwrap_or(s).to_lowercase()
}
