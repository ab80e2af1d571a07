// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! SS58-style address derivation and the tolerant `ip:port` extractor used to
//! turn a free-form on-chain address string into a [`ConnectionInfo`].
//!
//! The signing primitive itself (key generation, sign, verify) is an external
//! collaborator per the networking core's scope; this module only fixes the
//! textual identity format the core treats as authoritative, ported from
//! `smartdrive.commune.request._get_ip_port` / `_extract_address`.

use std::fmt;

use blake2::{digest::consts::U64, Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::hexutil::normalize_hex;

type Blake2b512 = Blake2b<U64>;

const SS58_PREFIX_CONTEXT: &[u8] = b"SS58PRE";
const SS58_FORMAT: u8 = 42;

/// Derive the canonical SS58-style address for an ed25519 public key.
///
/// Layout: `base58(format_byte || public_key || checksum[..2])`, where
/// `checksum = blake2b-512(b"SS58PRE" || format_byte || public_key)`. This
/// mirrors the Substrate SS58 scheme closely enough for interoperable
/// subnet addressing without depending on the chain client's own codec.
pub fn ss58_from_public_key(public_key: &[u8; 32]) -> String {
    let mut payload = Vec::with_capacity(1 + 32);
    payload.push(SS58_FORMAT);
    payload.extend_from_slice(public_key);

    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX_CONTEXT);
    hasher.update(&payload);
    let checksum = hasher.finalize();

    payload.extend_from_slice(&checksum[..2]);
    bs58::encode(payload).into_string()
}

/// Derive the SS58 address from a hex-encoded public key, as received on the
/// wire in `public_key_hex`.
pub fn ss58_from_public_key_hex(public_key_hex: &str) -> Result<String, Error> {
    let bytes = hex::decode(normalize_hex(public_key_hex)).map_err(|source| Error::InvalidHex {
        field: "public_key_hex",
        source,
    })?;
    let array: [u8; 32] = bytes
        .try_into()
        .map_err(|v: Vec<u8>| Error::InvalidPublicKeyLength(v.len()))?;
    Ok(ss58_from_public_key(&array))
}

/// Verify that an SS58 address decodes to a valid `(format, public_key, checksum)`
/// triple; used to sanity-check addresses pulled from the chain registry.
pub fn validate_ss58(address: &str) -> Result<(), Error> {
    let payload = bs58::decode(address)
        .into_vec()
        .map_err(|_| Error::InvalidSs58)?;
    if payload.len() < 3 {
        return Err(Error::InvalidSs58);
    }
    let (body, checksum) = payload.split_at(payload.len() - 2);
    let mut hasher = Blake2b512::new();
    hasher.update(SS58_PREFIX_CONTEXT);
    hasher.update(body);
    let expected = hasher.finalize();
    if &expected[..2] != checksum {
        return Err(Error::Ss58ChecksumMismatch);
    }
    Ok(())
}

/// Recover the 32-byte public key an SS58 address was derived from. The
/// encoding is reversible by construction (`payload = format || pubkey ||
/// checksum`), which lets `EVENT`/`EVENT_BATCH` handling verify a
/// `validator_ss58_address`'s signature without a separate key lookup.
pub fn public_key_from_ss58(address: &str) -> Result<[u8; 32], Error> {
    validate_ss58(address)?;
    let payload = bs58::decode(address)
        .into_vec()
        .map_err(|_| Error::InvalidSs58)?;
    payload[1..payload.len() - 2]
        .try_into()
        .map_err(|_| Error::InvalidSs58)
}

/// An `(ip, port)` pair extracted from a free-form on-chain address string.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionInfo {
    pub ip: String,
    pub port: u16,
}

impl ConnectionInfo {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }

    /// Tolerant IPv4-with-port parser. Scans for the first `d{1,3}.d{1,3}.d{1,3}.d{1,3}:d+`
    /// substring and returns `None` if no match is found, matching the
    /// original's best-effort regex extraction over whatever address format
    /// the chain happens to store.
    pub fn parse(address: &str) -> Option<Self> {
        let bytes = address.as_bytes();
        for start in 0..bytes.len() {
            if let Some((ip, port, consumed)) = try_match_ipv4_port(&bytes[start..]) {
                let _ = consumed;
                return Some(Self::new(ip, port));
            }
        }
        None
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ip, self.port)
    }
}

/// Attempts to match `d{1,3}.d{1,3}.d{1,3}.d{1,3}:d+` at the start of `bytes`.
fn try_match_ipv4_port(bytes: &[u8]) -> Option<(String, u16, usize)> {
    let mut idx = 0;
    let mut octets = Vec::with_capacity(4);

    for i in 0..4 {
        let start = idx;
        let mut len = 0;
        while len < 3 && idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
            len += 1;
        }
        if len == 0 {
            return None;
        }
        octets.push(std::str::from_utf8(&bytes[start..idx]).ok()?.to_string());
        if i < 3 {
            if idx >= bytes.len() || bytes[idx] != b'.' {
                return None;
            }
            idx += 1;
        }
    }

    if idx >= bytes.len() || bytes[idx] != b':' {
        return None;
    }
    idx += 1;

    let port_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == port_start {
        return None;
    }
    let port: u16 = std::str::from_utf8(&bytes[port_start..idx])
        .ok()?
        .parse()
        .ok()?;

    Some((octets.join("."), port, idx))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_embedded_ip_port() {
        let got = ConnectionInfo::parse("tcp://192.168.1.5:9001/whatever").unwrap();
        assert_eq!(got, ConnectionInfo::new("192.168.1.5", 9001));
    }

    #[test]
    fn returns_none_without_a_match() {
        assert!(ConnectionInfo::parse("not-an-address").is_none());
    }

    #[test]
    fn ss58_roundtrips_checksum() {
        let pk = [7u8; 32];
        let addr = ss58_from_public_key(&pk);
        assert!(validate_ss58(&addr).is_ok());
    }

    #[test]
    fn ss58_rejects_tampered_address() {
        let pk = [7u8; 32];
        let mut addr = ss58_from_public_key(&pk);
        addr.push('1');
        assert!(validate_ss58(&addr).is_err());
    }

    #[test]
    fn public_key_from_ss58_recovers_the_original_key() {
        let pk = [9u8; 32];
        let addr = ss58_from_public_key(&pk);
        assert_eq!(public_key_from_ss58(&addr).unwrap(), pk);
    }
}
