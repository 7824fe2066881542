//! AES-256-GCM sealing of result payloads.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use rand::RngCore;

use crate::envelope::{self, CURRENT_VERSION};
use crate::error::{DecryptError, Result};

/// Nonce size for AES-256-GCM (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Key size for AES-256 (256 bits)
pub const KEY_SIZE: usize = 32;

/// A 256-bit site key.
#[derive(Clone, PartialEq, Eq)]
pub struct ResultKey([u8; KEY_SIZE]);

impl ResultKey {
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::thread_rng().fill_bytes(&mut key);
        Self(key)
    }

    /// Parses a hex (64 chars) or base64 encoded key.
    pub fn parse(encoded: &str) -> std::result::Result<Self, String> {
        let encoded = encoded.trim();
        if encoded.len() == KEY_SIZE * 2
            && let Ok(bytes) = hex::decode(encoded)
        {
            return Self::from_slice(&bytes);
        }
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| format!("invalid base64 key: {e}"))?;
        Self::from_slice(&bytes)
    }

    fn from_slice(bytes: &[u8]) -> std::result::Result<Self, String> {
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| format!("key must be {KEY_SIZE} bytes, got {}", bytes.len()))?;
        Ok(Self(key))
    }

    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.0)
            .map_err(|e| DecryptError::cipher(format!("failed to create cipher: {e}")))
    }
}

impl std::fmt::Debug for ResultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ResultKey(<redacted>)")
    }
}

/// Encrypts `plaintext` into a current-version envelope.
pub fn seal(key: &ResultKey, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = key.cipher()?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    rand::thread_rng().fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|e| DecryptError::cipher(format!("encryption failed: {e}")))?;

    let mut raw = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    raw.extend_from_slice(&nonce_bytes);
    raw.extend_from_slice(&ciphertext);

    let mut out = envelope::marker(CURRENT_VERSION).into_bytes();
    out.extend_from_slice(BASE64.encode(raw).as_bytes());
    Ok(out)
}

/// Decrypts the base64 payload of an envelope.
pub fn open(key: &ResultKey, payload: &[u8]) -> Result<Vec<u8>> {
    let trimmed: Vec<u8> = payload
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let raw = BASE64
        .decode(&trimmed)
        .map_err(|e| DecryptError::malformed(format!("invalid base64 payload: {e}")))?;
    if raw.len() <= NONCE_SIZE {
        return Err(DecryptError::malformed("payload shorter than nonce"));
    }
    let (nonce_bytes, ciphertext) = raw.split_at(NONCE_SIZE);

    key.cipher()?
        .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
        .map_err(|e| DecryptError::cipher(format!("authentication failed: {e}")))
}
