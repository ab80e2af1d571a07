// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use std::path::Path;

use ed25519_dalek::SigningKey;
use rand::rngs::OsRng;

use crate::error::ConfigError;

/// Load the validator's Ed25519 signing key from a 64-character hex file at
/// `path`, generating and persisting a new one if the file doesn't exist.
/// Key management beyond this (encryption at rest, multiple accounts) is an
/// external collaborator's concern per `valnet_primitives::identity`'s own
/// scope note; the daemon only needs one key to bring the networking core up.
pub fn load_or_generate(path: &Path) -> Result<SigningKey, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(text) => parse_signing_key(path, text.trim()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => generate_and_persist(path),
        Err(e) => Err(ConfigError::Key(path.to_path_buf(), e.to_string())),
    }
}

fn parse_signing_key(path: &Path, hex_str: &str) -> Result<SigningKey, ConfigError> {
    let bytes = hex::decode(hex_str)
        .map_err(|e| ConfigError::Key(path.to_path_buf(), e.to_string()))?;
    let seed: [u8; 32] = bytes
        .try_into()
        .map_err(|_| ConfigError::Key(path.to_path_buf(), "expected a 32-byte seed".to_string()))?;
    Ok(SigningKey::from_bytes(&seed))
}

fn generate_and_persist(path: &Path) -> Result<SigningKey, ConfigError> {
    let signing_key = SigningKey::generate(&mut OsRng);
    std::fs::write(path, hex::encode(signing_key.to_bytes()))
        .map_err(|e| ConfigError::Key(path.to_path_buf(), e.to_string()))?;
    Ok(signing_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_and_reloads_the_same_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validator.key");

        let generated = load_or_generate(&path).unwrap();
        let reloaded = load_or_generate(&path).unwrap();
        assert_eq!(generated.to_bytes(), reloaded.to_bytes());
    }

    #[test]
    fn rejects_a_malformed_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("validator.key");
        std::fs::write(&path, "not hex").unwrap();

        assert!(load_or_generate(&path).is_err());
    }
}
