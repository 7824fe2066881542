//! Order transmission.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use labhub_core::{DocumentType, HubError, Result, paths};
use serde::Serialize;
use tracing::info;

use crate::gateway::HttpGateway;

/// Body of an order-document request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDocumentRequest {
    pub order_hl7: String,
    pub document_types: Vec<DocumentType>,
}

impl OrderDocumentRequest {
    pub fn new(hl7: &[u8], document_types: Vec<DocumentType>) -> Self {
        Self {
            order_hl7: BASE64.encode(hl7),
            document_types,
        }
    }

    pub(crate) fn to_value(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self)
            .map_err(|e| HubError::parse(format!("failed to encode order request: {e}"), ""))
    }
}

/// Posts HL7 orders to the hub.
#[derive(Debug, Clone)]
pub struct OrderTransmitter {
    gateway: Arc<HttpGateway>,
}

impl OrderTransmitter {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    /// Sends the order requesting every document type and returns the raw
    /// hub response. Storing the result is up to the caller.
    pub async fn transmit(&self, hl7: &[u8]) -> Result<String> {
        let request = OrderDocumentRequest::new(hl7, DocumentType::ALL.to_vec());
        let body = self
            .gateway
            .post(paths::ORDER_DOCUMENT, &request.to_value()?)
            .await?;
        info!(bytes = hl7.len(), "Order transmitted to hub");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_shape() {
        let request = OrderDocumentRequest::new(b"MSH|^~\\&|", DocumentType::ALL.to_vec());
        let value = request.to_value().unwrap();
        assert_eq!(value["orderHl7"], "TVNIfF5+XCZ8");
        assert_eq!(value["documentTypes"], serde_json::json!(["ABN", "REQ", "AOE"]));
    }
}
