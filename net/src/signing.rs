// Copyright 2026 Validator Net Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use serde_json::{json, Value};
use valnet_primitives::{Body, MessageCode, SignedEnvelope};

use crate::error::NetError;

/// Sign `body`'s canonical bytes, returning a lowercase hex signature.
pub fn sign_body(signing_key: &SigningKey, body: &Body) -> Result<String, NetError> {
    let bytes = body.canonical_bytes().map_err(NetError::Primitive)?;
    let signature = signing_key.sign(&bytes);
    Ok(hex::encode(signature.to_bytes()))
}

/// Build a complete envelope from `body`, signing it with `signing_key`.
pub fn seal(signing_key: &SigningKey, body: Body) -> Result<SignedEnvelope, NetError> {
    let signature_hex = sign_body(signing_key, &body)?;
    let public_key_hex = hex::encode(signing_key.verifying_key().to_bytes());
    Ok(SignedEnvelope::new(body, signature_hex, public_key_hex))
}

/// The `IDENTIFIER` envelope every peer-to-peer socket opens with (SPEC_FULL §6).
pub fn build_identifier(signing_key: &SigningKey, local_ss58_address: &str) -> Result<SignedEnvelope, NetError> {
    let body = Body::new(
        MessageCode::Identifier,
        json!({ "ss58_address": local_ss58_address }),
    );
    seal(signing_key, body)
}

/// Verify that `envelope.signature_hex` is a valid signature, by
/// `envelope.public_key_hex`, over `envelope.body`'s canonical bytes.
pub fn verify_envelope(envelope: &SignedEnvelope) -> Result<(), NetError> {
    let public_key_bytes = envelope.public_key_bytes().map_err(NetError::Primitive)?;
    let verifying_key =
        VerifyingKey::from_bytes(&public_key_bytes).map_err(|_| NetError::SignatureInvalid)?;

    let signature_bytes = envelope.signature_bytes().map_err(NetError::Primitive)?;
    let signature =
        Signature::from_slice(&signature_bytes).map_err(|_| NetError::SignatureInvalid)?;

    let body_bytes = envelope.body.canonical_bytes().map_err(NetError::Primitive)?;
    verifying_key
        .verify(&body_bytes, &signature)
        .map_err(|_| NetError::SignatureInvalid)
}

/// Verify a mempool event's `event_signed_params` against `event_params`,
/// recovering the signer's public key from `validator_ss58_address` itself
/// rather than requiring a separate key lookup (SS58 encodes the key).
pub fn verify_event_signature(
    validator_ss58_address: &str,
    event_params: &Value,
    event_signed_params: &str,
) -> Result<bool, NetError> {
    let public_key_bytes = valnet_primitives::public_key_from_ss58(validator_ss58_address)
        .map_err(NetError::Primitive)?;
    let verifying_key =
        VerifyingKey::from_bytes(&public_key_bytes).map_err(|_| NetError::SignatureInvalid)?;

    let signature_bytes = hex::decode(event_signed_params.trim_start_matches("0x"))
        .map_err(|_| NetError::SignatureInvalid)?;
    let signature =
        Signature::from_slice(&signature_bytes).map_err(|_| NetError::SignatureInvalid)?;

    let canonical = serde_json::to_vec(event_params).map_err(|e| NetError::Other(e.to_string()))?;
    Ok(verifying_key.verify(&canonical, &signature).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn identifier_envelope_verifies() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let envelope = build_identifier(&signing_key, "5Fvalidator").unwrap();
        assert!(verify_envelope(&envelope).is_ok());
    }

    #[test]
    fn tampered_body_fails_verification() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let mut envelope = build_identifier(&signing_key, "5Fvalidator").unwrap();
        envelope.body.data = json!({ "ss58_address": "5Fattacker" });
        assert!(verify_envelope(&envelope).is_err());
    }

    #[test]
    fn event_signature_round_trips() {
        let signing_key = SigningKey::generate(&mut OsRng);
        let address = valnet_primitives::ss58_from_public_key(&signing_key.verifying_key().to_bytes());
        let params = json!({ "uuid": "abc" });
        let bytes = serde_json::to_vec(&params).unwrap();
        let signature = hex::encode(signing_key.sign(&bytes).to_bytes());

        assert!(verify_event_signature(&address, &params, &signature).unwrap());
    }
}
