//! HL7 results retrieval.

use std::sync::Arc;

use labhub_core::{Result, paths};
use serde_json::json;
use tracing::info;

use crate::gateway::HttpGateway;

/// Pulls pending HL7 results from the hub.
#[derive(Debug, Clone)]
pub struct ResultsRetriever {
    gateway: Arc<HttpGateway>,
}

impl ResultsRetriever {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Returns the raw response body. Parsing the HL7 batch is left to the host.
    pub async fn retrieve_hl7(&self) -> Result<String> {
        let body = self
            .gateway
            .post(paths::RESULTS, &json!({ "resultServiceType": "HL7" }))
            .await?;
        info!(bytes = body.len(), "Retrieved HL7 results");
        Ok(body)
    }
}
