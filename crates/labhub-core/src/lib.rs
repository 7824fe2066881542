pub mod catalog;
pub mod error;
pub mod hub;
pub mod order;

pub use catalog::{DATASET_GROUP_NAME, FieldType, ProcedureQuestion, ProcedureType};
pub use error::{ErrorCategory, HubError, Result};
pub use hub::{HubMode, paths};
pub use order::{AbnRequirement, BillingType, DocumentType, LabOrder, OrderMetadata};
