//! Requisition document retrieval.
//!
//! The hub answers an order-document request with a package of support
//! documents. The first document's payload is base64 of base64 of the PDF.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use labhub_core::{
    AbnRequirement, BillingType, DocumentType, HubError, LabOrder, OrderMetadata, Result, paths,
};
use labhub_storage::DynQuestionLookup;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::gateway::HttpGateway;
use crate::order::OrderDocumentRequest;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequisitionPackage {
    #[serde(default)]
    pub order_support_documents: Vec<SupportDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportDocument {
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub document_data: String,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub request_status: Option<String>,
}

/// A decoded requisition written to disk.
#[derive(Debug, Clone)]
pub struct Requisition {
    pub file_name: String,
    pub path: PathBuf,
    pub document_type: String,
    pub pdf: Vec<u8>,
}

/// Which documents to request for an order.
///
/// REQ is always requested. ABN only for third-party billing where the ABN
/// is not flagged as not required. AOE only when questions are unanswered.
pub fn select_document_types(meta: &OrderMetadata, unanswered_questions: u64) -> Vec<DocumentType> {
    let mut types = Vec::with_capacity(3);
    if meta.billing_type == BillingType::ThirdParty && meta.abn != AbnRequirement::NotRequired {
        types.push(DocumentType::Abn);
    }
    types.push(DocumentType::Req);
    if unanswered_questions > 0 {
        types.push(DocumentType::Aoe);
    }
    types
}

/// Decodes a payload that was base64 encoded twice.
///
/// ASCII whitespace in either layer is ignored; any other invalid byte is an
/// error.
pub fn decode_double_base64(data: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let outer = strip_whitespace(data.as_bytes());
    let intermediate = BASE64.decode(outer)?;
    BASE64.decode(strip_whitespace(&intermediate))
}

fn strip_whitespace(bytes: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .copied()
        .filter(|b| !b.is_ascii_whitespace())
        .collect()
}

/// File name for a requisition document: `<kind>-<orderId>-<unixMillis>.pdf`.
pub fn requisition_file_name(document_type: &str, order_id: i64, unix_millis: i128) -> String {
    let codes: Vec<String> = document_type
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();
    let has = |code: &str| codes.iter().any(|c| c == code);

    let kind = if has("ABN") && has("REQ") {
        "abn-requisition"
    } else if has("ABN") {
        "abn"
    } else if has("AOE") {
        "aoe"
    } else {
        "requisition"
    };
    format!("{kind}-{order_id}-{unix_millis}.pdf")
}

/// Creates the directory if needed and restricts it to owner and group.
pub async fn ensure_directory(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| HubError::file_system("create requisition directory", dir, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o770))
            .await
            .map_err(|e| HubError::file_system("set requisition directory permissions", dir, e))?;
    }
    Ok(())
}

/// Requests, decodes and stores requisition PDFs. Makes a single attempt;
/// see [`crate::retry`] for the retrying caller.
#[derive(Clone)]
pub struct RequisitionFetcher {
    gateway: Arc<HttpGateway>,
    questions: DynQuestionLookup,
    directory: PathBuf,
}

impl RequisitionFetcher {
    pub fn new(
        gateway: Arc<HttpGateway>,
        questions: DynQuestionLookup,
        directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            gateway,
            questions,
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub async fn document_types(&self, meta: &OrderMetadata) -> Result<Vec<DocumentType>> {
        let unanswered = self
            .questions
            .unanswered_question_count(meta.order_id)
            .await
            .map_err(|e| HubError::storage(e.to_string()))?;
        Ok(select_document_types(meta, unanswered))
    }

    pub async fn fetch(&self, order: &LabOrder) -> Result<Requisition> {
        let order_id = order.order_id();
        let document_types = self.document_types(&order.metadata).await?;
        debug!(order_id, ?document_types, "Requesting requisition documents");

        let request = OrderDocumentRequest::new(&order.hl7, document_types);
        let body = self
            .gateway
            .post(paths::ORDER_DOCUMENT, &request.to_value()?)
            .await?;

        let package: RequisitionPackage = serde_json::from_str(&body).map_err(|e| {
            HubError::parse(format!("invalid requisition response: {e}"), body.clone())
        })?;
        let Some(document) = package.order_support_documents.into_iter().next() else {
            warn!(order_id, body = %body, "Requisition response has no documents");
            return Err(HubError::parse("orderSupportDocuments is missing or empty", body));
        };

        let pdf = match decode_double_base64(&document.document_data) {
            Ok(pdf) => pdf,
            Err(e) => {
                warn!(order_id, error = %e, "Requisition payload is not valid double base64");
                return Err(HubError::http(200, body));
            }
        };

        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let file_name = requisition_file_name(&document.document_type, order_id, millis);
        let path = self.persist(&file_name, &pdf).await?;
        info!(order_id, file = %path.display(), bytes = pdf.len(), "Requisition saved");

        Ok(Requisition {
            file_name,
            path,
            document_type: document.document_type,
            pdf,
        })
    }

    async fn persist(&self, file_name: &str, pdf: &[u8]) -> Result<PathBuf> {
        ensure_directory(&self.directory).await?;
        let path = self.directory.join(file_name);
        tokio::fs::write(&path, pdf)
            .await
            .map_err(|e| HubError::file_system("write requisition", &path, e))?;
        Ok(path)
    }
}

impl std::fmt::Debug for RequisitionFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequisitionFetcher")
            .field("gateway", &self.gateway)
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}
