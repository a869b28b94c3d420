use crate::error::{Result, SdkError};
use crate::types::KeyPair;
use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;

/// Generate a fresh Ed25519 key pair, base58 encoded
pub fn generate_keypair() -> KeyPair {
    let signing_key = SigningKey::generate(&mut OsRng);
    keypair_from_signing_key(&signing_key)
}

pub fn keypair_from_signing_key(signing_key: &SigningKey) -> KeyPair {
    KeyPair {
        public_key: bs58::encode(signing_key.verifying_key().to_bytes()).into_string(),
        private_key: bs58::encode(signing_key.to_bytes()).into_string(),
    }
}

/// Decode a base58 private key (32-byte seed)
pub fn signing_key_from_base58(private_key: &str) -> Result<SigningKey> {
    let bytes = bs58::decode(private_key.trim())
        .into_vec()
        .map_err(|e| SdkError::InvalidKey(format!("private key is not base58: {}", e)))?;

    let seed: [u8; SECRET_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        SdkError::InvalidKey(format!(
            "private key must be {} bytes, got {}",
            SECRET_KEY_LENGTH,
            b.len()
        ))
    })?;

    Ok(SigningKey::from_bytes(&seed))
}

/// Decode a base58 public key
pub fn verifying_key_from_base58(public_key: &str) -> Result<VerifyingKey> {
    let bytes = bs58::decode(public_key.trim())
        .into_vec()
        .map_err(|e| SdkError::InvalidKey(format!("public key is not base58: {}", e)))?;

    let raw: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
        SdkError::InvalidKey(format!(
            "public key must be {} bytes, got {}",
            PUBLIC_KEY_LENGTH,
            b.len()
        ))
    })?;

    VerifyingKey::from_bytes(&raw)
        .map_err(|e| SdkError::InvalidKey(format!("public key is not a curve point: {}", e)))
}
