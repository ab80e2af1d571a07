// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;
use crate::hexutil::normalize_hex;

/// The set of message kinds carried in a signed envelope's `body.code`. An
/// unrecognized `code` string deserializes into [`MessageCode::Unknown`]
/// rather than failing the whole frame, so a single out-of-band or
/// newer-version message from an otherwise-good peer gets logged and
/// dropped by the receiver instead of tearing down the connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageCode {
    Identifier,
    Ping,
    Pong,
    Event,
    EventBatch,
    DbSyncRequest,
    DbSyncResponse,
    #[serde(other)]
    Unknown,
}

/// The signed portion of an envelope: `{code, data}`. Everything that gets
/// authenticated is inside `body` — the envelope's `signature_hex` and
/// `public_key_hex` sit alongside it, unsigned.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Body {
    pub code: MessageCode,
    #[serde(default = "default_data")]
    pub data: Value,
}

fn default_data() -> Value {
    Value::Object(Default::default())
}

impl Body {
    pub fn new(code: MessageCode, data: Value) -> Self {
        Self { code, data }
    }

    /// Canonical signing bytes: `body` re-serialized with sorted object keys
    /// and no insignificant whitespace, UTF-8 encoded. `serde_json::Value`
    /// already sorts map keys on serialization when the `preserve_order`
    /// feature is disabled (the default used here), which gives us sorted
    /// keys for free; the lack of any pretty-printing gives minimal
    /// whitespace. Fixing this once, here, is what makes `signature_hex`
    /// interoperable across implementations (see SPEC_FULL §9).
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, Error> {
        serde_json::to_vec(self).map_err(|e| Error::Other(e.to_string()))
    }
}

/// A complete signed message as it appears on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignedEnvelope {
    pub body: Body,
    pub signature_hex: String,
    pub public_key_hex: String,
}

impl SignedEnvelope {
    pub fn new(body: Body, signature_hex: String, public_key_hex: String) -> Self {
        Self {
            body,
            signature_hex,
            public_key_hex,
        }
    }

    pub fn signature_bytes(&self) -> Result<Vec<u8>, Error> {
        hex::decode(normalize_hex(&self.signature_hex)).map_err(|source| Error::InvalidHex {
            field: "signature_hex",
            source,
        })
    }

    pub fn public_key_bytes(&self) -> Result<[u8; 32], Error> {
        let bytes = hex::decode(normalize_hex(&self.public_key_hex)).map_err(|source| {
            Error::InvalidHex {
                field: "public_key_hex",
                source,
            }
        })?;
        bytes
            .try_into()
            .map_err(|v: Vec<u8>| Error::InvalidPublicKeyLength(v.len()))
    }

    /// The SS58 address this envelope claims to be signed by, derived from
    /// its own `public_key_hex`. Callers must compare this against any
    /// address asserted elsewhere in the message (e.g. `IDENTIFIER`'s
    /// `data.ss58_address`) to rule out identity spoofing.
    pub fn derived_ss58_address(&self) -> Result<String, Error> {
        crate::identity::ss58_from_public_key_hex(&self.public_key_hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_bytes_sort_keys() {
        let body = Body::new(MessageCode::Ping, json!({"b": 1, "a": 2}));
        let bytes = body.canonical_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.find("\"a\"").unwrap() < text.find("\"b\"").unwrap());
        assert!(!text.contains(' '));
    }

    #[test]
    fn changing_any_byte_changes_canonical_form() {
        let a = Body::new(MessageCode::Ping, json!({"nonce": 1}));
        let b = Body::new(MessageCode::Ping, json!({"nonce": 2}));
        assert_ne!(a.canonical_bytes().unwrap(), b.canonical_bytes().unwrap());
    }
}
