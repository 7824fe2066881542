//! Compendium file listing.

use std::sync::Arc;

use labhub_client::HttpGateway;
use labhub_core::{HubError, paths};
use serde_json::Value;
use tracing::debug;

/// Marker in the name of the full compendium dataset.
pub const FULL_DATASET_MARKER: &str = "TMP_CDC_FULL";

/// A downloadable compendium archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompendiumFile {
    pub file_name: String,
    /// Resource path, already prefixed with the resource server root
    pub retrieve_uri: String,
}

/// Picks the full dataset out of a listing response.
///
/// The listing groups entries under arbitrary keys; every entry carrying a
/// `fileName` is considered, wherever it is nested.
pub fn select_full_dataset(listing: &str) -> labhub_core::Result<CompendiumFile> {
    let value: Value = serde_json::from_str(listing)
        .map_err(|e| HubError::parse(format!("invalid compendium listing: {e}"), listing))?;

    let mut entries = Vec::new();
    collect_entries(&value, &mut entries);

    entries
        .into_iter()
        .find_map(|entry| {
            let file_name = entry.get("fileName")?.as_str()?;
            let uri = entry.get("retrieveURI")?.as_str()?;
            file_name.contains(FULL_DATASET_MARKER).then(|| CompendiumFile {
                file_name: file_name.to_string(),
                retrieve_uri: format!("{}{uri}", paths::RESOURCE_SERVER_PREFIX),
            })
        })
        .ok_or_else(|| {
            HubError::parse(
                format!("no {FULL_DATASET_MARKER} entry in compendium listing"),
                listing,
            )
        })
}

fn collect_entries<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) if map.contains_key("fileName") => out.push(value),
        Value::Object(map) => map.values().for_each(|v| collect_entries(v, out)),
        Value::Array(items) => items.iter().for_each(|v| collect_entries(v, out)),
        _ => {}
    }
}

/// Lists compendium files available to a receiving facility.
#[derive(Debug, Clone)]
pub struct CompendiumCatalog {
    gateway: Arc<HttpGateway>,
}

impl CompendiumCatalog {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    pub async fn request_listing(&self, receiver_id: &str) -> labhub_core::Result<String> {
        let body = self.gateway.get(&paths::compendium_listing(receiver_id)).await?;
        debug!(receiver_id, bytes = body.len(), "Received compendium listing");
        Ok(body)
    }

    pub async fn full_dataset(&self, receiver_id: &str) -> labhub_core::Result<CompendiumFile> {
        let listing = self.request_listing(receiver_id).await?;
        select_full_dataset(&listing)
    }
}
