//! Wiring from configuration to the library components.

use std::sync::Arc;

use anyhow::{Context, Result};
use labhub_client::HttpGateway;
use labhub_config::AppConfig;
use labhub_db_postgres::{PostgresConfig, PostgresStorage};
use labhub_results::{KeySource, ResultDecryptor, StaticKeySource, StoredKeySource};
use labhub_storage::{
    BackgroundServices, DynCatalogStore, DynKeyStore, DynQuestionLookup, InMemoryStorage,
};
use tracing::{debug, warn};

/// Storage handles for the configured backend.
pub struct Storage {
    pub catalog: DynCatalogStore,
    pub questions: DynQuestionLookup,
    pub services: Arc<dyn BackgroundServices>,
    /// Only the database backend holds result keys.
    pub keys: Option<DynKeyStore>,
    pub persistent: bool,
}

impl Storage {
    /// Postgres when `[storage.postgres]` is configured, otherwise an
    /// in-memory store that lives for this process only.
    pub async fn open(config: &AppConfig) -> Result<Self> {
        match &config.storage.postgres {
            Some(pg) => {
                let storage =
                    PostgresStorage::new(PostgresConfig::from(pg).with_application_name("labhub-cli"))
                        .await
                        .context("Failed to open PostgreSQL storage")?;
                let storage = Arc::new(storage);
                Ok(Self {
                    catalog: storage.clone(),
                    questions: storage.clone(),
                    services: storage.clone(),
                    keys: Some(storage as DynKeyStore),
                    persistent: true,
                })
            }
            None => {
                warn!("No [storage.postgres] configured, using in-memory storage");
                let storage = Arc::new(InMemoryStorage::new());
                Ok(Self {
                    catalog: storage.clone(),
                    questions: storage.clone(),
                    services: storage,
                    keys: None,
                    persistent: false,
                })
            }
        }
    }
}

pub fn gateway(config: &AppConfig) -> Result<Arc<HttpGateway>> {
    let gateway = HttpGateway::new(&config.hub, config.hub_mode())
        .context("Failed to set up the hub client")?;
    Ok(Arc::new(gateway))
}

/// `LABHUB_RESULT_KEY` first, then the database keys table. Without either,
/// every key lookup fails, which only matters when encryption is enabled.
pub async fn decryptor(config: &AppConfig) -> Result<ResultDecryptor> {
    let source: Arc<dyn KeySource> = if let Some(keys) = StaticKeySource::from_env()? {
        debug!("Using result key from environment");
        Arc::new(keys)
    } else if config.site.drive_encryption && config.storage.postgres.is_some() {
        let storage = Storage::open(config).await?;
        match storage.keys {
            Some(keys) => Arc::new(StoredKeySource::new(keys)),
            None => Arc::new(StaticKeySource::new()),
        }
    } else {
        Arc::new(StaticKeySource::new())
    };

    Ok(ResultDecryptor::new(
        source,
        config.results.key_name.clone(),
        config.site.drive_encryption,
    ))
}
