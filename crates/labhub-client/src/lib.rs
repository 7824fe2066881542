//! Client for the lab hub REST API.
//!
//! [`HttpGateway`] is the only component that talks to the network. The
//! rest build payloads and interpret responses on top of it:
//!
//! - [`TokenProvider`]: client-credentials tokens, fetched per request
//! - [`OrderTransmitter`]: posts HL7 orders
//! - [`RequisitionFetcher`]: requests, decodes and stores requisition PDFs
//! - [`retry_with_backoff`]: bounded exponential backoff around the requisition step
//! - [`ResultsRetriever`]: pulls HL7 results
//! - [`LabOrderWorkflow`]: transmit then best-effort requisition download

pub mod gateway;
pub mod order;
pub mod requisition;
pub mod results;
pub mod retry;
pub mod token;
pub mod workflow;

pub use gateway::HttpGateway;
pub use order::{OrderDocumentRequest, OrderTransmitter};
pub use requisition::{
    Requisition, RequisitionFetcher, RequisitionPackage, SupportDocument, decode_double_base64,
    requisition_file_name, select_document_types,
};
pub use results::ResultsRetriever;
pub use retry::{RetryOutcome, RetryPolicy, retry_with_backoff};
pub use token::{Token, TokenProvider};
pub use workflow::{LabOrderWorkflow, RequisitionStatus, SubmissionOutcome};
