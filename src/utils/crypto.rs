// Cryptographic utilities for session cookies and OAuth nonces

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use anyhow::{anyhow, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use rand::{distr::Alphanumeric, Rng, RngCore};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};

/// Nonce size for AES-256-GCM encryption (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Encryption key size for AES-256 (256 bits)
pub const ENCRYPTION_KEY_SIZE: usize = 32;

/// Length of the `oauth_nonce` sent with every signed request
pub const OAUTH_NONCE_LENGTH: usize = 32;

/// Generate an alphanumeric `oauth_nonce`
#[must_use]
pub fn generate_oauth_nonce() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(OAUTH_NONCE_LENGTH)
        .map(char::from)
        .collect()
}

/// Generate a random secret suitable for [`derive_encryption_key`]
///
/// 32 bytes of entropy, base64 encoded
#[must_use]
pub fn generate_session_secret() -> String {
    let mut secret = [0u8; ENCRYPTION_KEY_SIZE];
    rand::rng().fill_bytes(&mut secret);
    general_purpose::STANDARD.encode(secret)
}

/// Encrypt any serializable value with AES-256-GCM
///
/// Returns a Base64URL string containing the nonce followed by the ciphertext.
///
/// # Errors
///
/// Returns an error if:
/// - Serialization fails
/// - Key length is invalid
/// - AES encryption fails
pub fn encrypt_data<T: Serialize>(data: &T, key: &[u8]) -> Result<String> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let json_data = serde_json::to_vec(data).context("Failed to serialize data")?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let ciphertext = cipher
        .encrypt(nonce, json_data.as_slice())
        .map_err(|e| anyhow!("AES encryption failed: {e}"))?;

    let mut combined = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    combined.extend_from_slice(&nonce_bytes);
    combined.extend_from_slice(&ciphertext);

    Ok(general_purpose::URL_SAFE_NO_PAD.encode(&combined))
}

/// Decrypt a value produced by [`encrypt_data`]
///
/// # Errors
///
/// Returns an error if:
/// - Key length is invalid
/// - Base64 decoding fails
/// - Data length is invalid
/// - AES decryption fails (wrong key or tampered data)
/// - Deserialization fails
pub fn decrypt_data<T: DeserializeOwned>(encrypted_data: &str, key: &[u8]) -> Result<T> {
    if key.len() != ENCRYPTION_KEY_SIZE {
        return Err(anyhow!(
            "Invalid key length: expected {} bytes, got {}",
            ENCRYPTION_KEY_SIZE,
            key.len()
        ));
    }

    let combined = general_purpose::URL_SAFE_NO_PAD
        .decode(encrypted_data)
        .context("Failed to decode base64 data")?;

    if combined.len() < NONCE_SIZE {
        return Err(anyhow!("Invalid data length"));
    }

    let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| anyhow!("AES decryption failed: {e}"))?;

    serde_json::from_slice(&plaintext).context("Failed to deserialize data from decrypted JSON")
}

/// Derive a 32-byte AES-256 key from arbitrary secret material (SHA-256)
#[must_use]
pub fn derive_encryption_key(input_key: &[u8]) -> [u8; ENCRYPTION_KEY_SIZE] {
    Sha256::digest(input_key).into()
}
