//! Listing, download, extraction and import in one call.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use labhub_client::HttpGateway;
use labhub_config::AppConfig;
use labhub_core::HubError;
use labhub_storage::DynCatalogStore;
use tracing::{info, warn};

use crate::download::{download_to, extract_archive};
use crate::error::{CompendiumError, Result};
use crate::import::{CatalogImporter, ImportReport};
use crate::listing::CompendiumCatalog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub file_name: String,
    pub bytes: u64,
    pub import: ImportReport,
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "File downloaded successfully imported into database: {} ({} procedures, {} questions)",
            self.file_name, self.import.order_codes.inserted, self.import.questions.inserted
        )
    }
}

pub struct CompendiumSync {
    gateway: Arc<HttpGateway>,
    catalog: CompendiumCatalog,
    importer: CatalogImporter,
    temp_dir: PathBuf,
    receiver_id: String,
}

impl CompendiumSync {
    pub fn new(
        gateway: Arc<HttpGateway>,
        store: DynCatalogStore,
        lab_id: i64,
        temp_dir: impl Into<PathBuf>,
        receiver_id: impl Into<String>,
    ) -> Self {
        Self {
            catalog: CompendiumCatalog::new(gateway.clone()),
            gateway,
            importer: CatalogImporter::new(store, lab_id),
            temp_dir: temp_dir.into(),
            receiver_id: receiver_id.into(),
        }
    }

    /// Builds from configuration; the receiving facility id is required.
    pub fn from_config(
        gateway: Arc<HttpGateway>,
        store: DynCatalogStore,
        config: &AppConfig,
    ) -> labhub_core::Result<Self> {
        let receiver_id = config
            .hub
            .receiver_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| HubError::config("hub.receiver_id", "hub.receiver_id is not configured"))?;
        Ok(Self::new(
            gateway,
            store,
            config.compendium.lab_id,
            &config.compendium.temp_dir,
            receiver_id,
        ))
    }

    pub fn catalog(&self) -> &CompendiumCatalog {
        &self.catalog
    }

    pub fn receiver_id(&self) -> &str {
        &self.receiver_id
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Downloads the archive into the temp directory, extracts it, imports
    /// the catalog and removes the archive.
    ///
    /// When extraction fails nothing is imported and the archive is left in
    /// place for inspection.
    pub async fn download(&self, file_name: &str, retrieve_uri: &str) -> Result<SyncReport> {
        let file_name = Path::new(file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HubError::parse("compendium file name is empty", file_name))?
            .to_string();
        let archive = self.temp_dir.join(&file_name);

        let bytes = download_to(&self.gateway, retrieve_uri, &archive).await?;

        if let Err(e) = extract_archive(&archive, &self.temp_dir).await {
            warn!(archive = %archive.display(), error = %e, "Error unzipping file");
            return Err(e);
        }

        let import = self.import().await?;
        tokio::fs::remove_file(&archive)
            .await
            .map_err(|e| CompendiumError::file_system("remove archive", &archive, e))?;

        let report = SyncReport {
            file_name,
            bytes,
            import,
        };
        info!(%report, "Compendium sync finished");
        Ok(report)
    }

    /// Imports previously extracted files from the temp directory.
    pub async fn import(&self) -> Result<ImportReport> {
        self.importer
            .import_directory(&self.temp_dir, &self.receiver_id)
            .await
    }

    /// Full run: listing, then download, then import.
    pub async fn sync(&self) -> Result<SyncReport> {
        let file = self.catalog.full_dataset(&self.receiver_id).await?;
        info!(file = %file.file_name, "Selected full compendium dataset");
        self.download(&file.file_name, &file.retrieve_uri).await
    }
}

impl std::fmt::Debug for CompendiumSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompendiumSync")
            .field("temp_dir", &self.temp_dir)
            .field("receiver_id", &self.receiver_id)
            .finish_non_exhaustive()
    }
}
