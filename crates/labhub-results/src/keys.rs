//! Where decryption keys come from.

use std::collections::HashMap;

use async_trait::async_trait;
use labhub_storage::DynKeyStore;
use tracing::debug;

use crate::cipher::ResultKey;
use crate::error::{DecryptError, Result};

/// Environment variable read by [`StaticKeySource::from_env`].
pub const RESULT_KEY_ENV: &str = "LABHUB_RESULT_KEY";

/// Key name for an envelope version: `<prefix>_v<version>`.
pub fn key_name(prefix: &str, version: u8) -> String {
    format!("{prefix}_v{version}")
}

#[async_trait]
pub trait KeySource: Send + Sync {
    /// Resolves the key registered under `name`.
    async fn key(&self, name: &str) -> Result<ResultKey>;
}

/// Keys held in memory. A fallback key, when set, answers every name that
/// has no explicit entry.
#[derive(Debug, Clone, Default)]
pub struct StaticKeySource {
    keys: HashMap<String, ResultKey>,
    fallback: Option<ResultKey>,
}

impl StaticKeySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(key: ResultKey) -> Self {
        Self {
            keys: HashMap::new(),
            fallback: Some(key),
        }
    }

    #[must_use]
    pub fn with_key(mut self, name: impl Into<String>, key: ResultKey) -> Self {
        self.keys.insert(name.into(), key);
        self
    }

    /// Reads a single hex or base64 key from `LABHUB_RESULT_KEY`.
    /// `Ok(None)` when the variable is unset.
    pub fn from_env() -> Result<Option<Self>> {
        match std::env::var(RESULT_KEY_ENV) {
            Ok(value) => ResultKey::parse(&value)
                .map(|key| Some(Self::single(key)))
                .map_err(|message| DecryptError::encryption_key(RESULT_KEY_ENV, message)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(DecryptError::encryption_key(RESULT_KEY_ENV, e.to_string())),
        }
    }
}

#[async_trait]
impl KeySource for StaticKeySource {
    async fn key(&self, name: &str) -> Result<ResultKey> {
        self.keys
            .get(name)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| DecryptError::encryption_key(name, "no such key"))
    }
}

/// Keys read from the host database through a [`labhub_storage::KeyStore`].
#[derive(Clone)]
pub struct StoredKeySource {
    store: DynKeyStore,
}

impl StoredKeySource {
    pub fn new(store: DynKeyStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl KeySource for StoredKeySource {
    async fn key(&self, name: &str) -> Result<ResultKey> {
        let value = self
            .store
            .key_value(name)
            .await
            .map_err(|e| DecryptError::encryption_key(name, e.to_string()))?
            .ok_or_else(|| DecryptError::encryption_key(name, "key is not registered"))?;
        debug!(key = name, "Loaded result key from storage");
        ResultKey::parse(&value).map_err(|message| DecryptError::encryption_key(name, message))
    }
}
