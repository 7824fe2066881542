use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use labhub_client::HttpGateway;
use labhub_compendium::{CatalogImporter, CompendiumCatalog, CompendiumSync, select_full_dataset};
use labhub_config::AppConfig;
use labhub_core::HubError;

use crate::context::Storage;
use crate::output::{print_field, print_import_report, print_success, print_warning};

pub async fn list(config: &AppConfig, gateway: Arc<HttpGateway>) -> Result<()> {
    let receiver_id = receiver_id(config)?;
    let listing = CompendiumCatalog::new(gateway)
        .request_listing(receiver_id)
        .await
        .context("Compendium listing failed")?;

    match serde_json::from_str::<serde_json::Value>(&listing) {
        Ok(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        Err(_) => println!("{listing}"),
    }
    match select_full_dataset(&listing) {
        Ok(file) => {
            print_field("Full dataset", &file.file_name);
            print_field("Retrieve URI", &file.retrieve_uri);
        }
        Err(e) => print_warning(&format!("No full dataset offered: {e}")),
    }
    Ok(())
}

pub async fn sync(config: &AppConfig, gateway: Arc<HttpGateway>, storage: &Storage) -> Result<()> {
    warn_if_ephemeral(storage);
    let sync = CompendiumSync::from_config(gateway, storage.catalog.clone(), config)?;
    let report = sync.sync().await.context("Compendium sync failed")?;
    print_success(&report.to_string());
    print_import_report(&report.import);
    Ok(())
}

pub async fn import(config: &AppConfig, storage: &Storage, dir: &Path) -> Result<()> {
    warn_if_ephemeral(storage);
    let receiver_id = receiver_id(config)?;
    let report = CatalogImporter::new(storage.catalog.clone(), config.compendium.lab_id)
        .import_directory(dir, receiver_id)
        .await
        .with_context(|| format!("Compendium import from {} failed", dir.display()))?;
    print_success(&format!("Compendium imported from {}", dir.display()));
    print_import_report(&report);
    Ok(())
}

fn receiver_id(config: &AppConfig) -> Result<&str> {
    config
        .hub
        .receiver_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| HubError::config("hub.receiver_id", "hub.receiver_id is not configured").into())
}

fn warn_if_ephemeral(storage: &Storage) {
    if !storage.persistent {
        print_warning("No database configured, the imported catalog is discarded on exit");
    }
}
