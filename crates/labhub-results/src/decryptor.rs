//! Decryption of stored result files.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::cipher;
use crate::envelope;
use crate::error::{DecryptError, Result};
use crate::keys::{KeySource, key_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptStatus {
    Decrypted { version: u8 },
    /// Encryption is disabled for the site; the input was returned as is.
    PassThrough,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decrypted {
    pub bytes: Vec<u8>,
    pub status: DecryptStatus,
}

impl Decrypted {
    /// Pass-through is a warning condition the caller should surface.
    pub fn is_warning(&self) -> bool {
        self.status == DecryptStatus::PassThrough
    }
}

/// Decrypts result files with site keys.
#[derive(Clone)]
pub struct ResultDecryptor {
    keys: Arc<dyn KeySource>,
    key_prefix: String,
    drive_encryption: bool,
}

impl ResultDecryptor {
    pub fn new(keys: Arc<dyn KeySource>, key_prefix: impl Into<String>, drive_encryption: bool) -> Self {
        Self {
            keys,
            key_prefix: key_prefix.into(),
            drive_encryption,
        }
    }

    pub async fn decrypt(&self, raw: &[u8]) -> Result<Decrypted> {
        if !self.drive_encryption {
            warn!("Drive encryption is disabled, returning content unchanged");
            return Ok(Decrypted {
                bytes: raw.to_vec(),
                status: DecryptStatus::PassThrough,
            });
        }

        let env = envelope::parse(raw)?;
        let name = key_name(&self.key_prefix, env.version);
        let key = self.keys.key(&name).await?;
        let bytes = cipher::open(&key, env.payload)?;
        if bytes.is_empty() {
            return Err(DecryptError::EmptyOutput);
        }
        debug!(version = env.version, bytes = bytes.len(), "Result decrypted");
        Ok(Decrypted {
            bytes,
            status: DecryptStatus::Decrypted {
                version: env.version,
            },
        })
    }
}

impl std::fmt::Debug for ResultDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultDecryptor")
            .field("key_prefix", &self.key_prefix)
            .field("drive_encryption", &self.drive_encryption)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{ResultKey, seal};
    use crate::keys::StaticKeySource;

    fn decryptor(key: &ResultKey, enabled: bool) -> ResultDecryptor {
        let keys = StaticKeySource::new().with_key("labhub_result_v6", key.clone());
        ResultDecryptor::new(Arc::new(keys), "labhub_result", enabled)
    }

    #[tokio::test]
    async fn test_pass_through_when_disabled() {
        let input = b"\x00\xffanything at all 001";
        let out = decryptor(&ResultKey::generate(), false)
            .decrypt(input)
            .await
            .unwrap();
        assert_eq!(out.bytes, input);
        assert!(out.is_warning());
    }

    #[tokio::test]
    async fn test_decrypts_sealed_result() {
        let key = ResultKey::generate();
        let sealed = seal(&key, b"MSH|^~\\&|LAB").unwrap();
        let out = decryptor(&key, true).decrypt(&sealed).await.unwrap();
        assert_eq!(out.bytes, b"MSH|^~\\&|LAB");
        assert_eq!(out.status, DecryptStatus::Decrypted { version: 6 });
        assert!(!out.is_warning());
    }

    #[tokio::test]
    async fn test_empty_plaintext_is_error() {
        let key = ResultKey::generate();
        let sealed = seal(&key, b"").unwrap();
        assert!(matches!(
            decryptor(&key, true).decrypt(&sealed).await,
            Err(DecryptError::EmptyOutput)
        ));
    }

    #[tokio::test]
    async fn test_missing_key_for_version() {
        let key = ResultKey::generate();
        let mut sealed = seal(&key, b"OBX").unwrap();
        sealed[2] = b'3';
        assert!(matches!(
            decryptor(&key, true).decrypt(&sealed).await,
            Err(DecryptError::EncryptionKey { ref name, .. }) if name == "labhub_result_v3"
        ));
    }

    #[tokio::test]
    async fn test_plaintext_with_encryption_enabled_is_error() {
        let err = decryptor(&ResultKey::generate(), true)
            .decrypt(b"MSH|^~\\&|LAB")
            .await
            .unwrap_err();
        assert!(matches!(err, DecryptError::UnsupportedVersion(_)));
    }
}
