//! Storage traits every backend implements.

use async_trait::async_trait;
use labhub_core::{ProcedureQuestion, ProcedureType};

use crate::error::StorageError;

/// Row name of the background service that polls the hub for results.
pub const RESULTS_SERVICE_NAME: &str = "Quest_Lab_Hub";

/// Catalog of orderable tests and their AOE questions.
///
/// Inserts never overwrite: a row whose key already exists is left as is and
/// the call reports `false`.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the id of the dataset group row, creating it if absent.
    ///
    /// Must be atomic: concurrent first calls resolve to the same row.
    async fn ensure_dataset_group(&self, lab_id: i64) -> Result<i64, StorageError>;

    /// Whether a procedure type with this code exists.
    async fn procedure_code_exists(&self, procedure_code: &str) -> Result<bool, StorageError>;

    /// Inserts a procedure type keyed by its code. Returns whether a row was created.
    async fn insert_procedure_type(
        &self,
        lab_id: i64,
        record: &ProcedureType,
    ) -> Result<bool, StorageError>;

    /// Inserts a question keyed by lab, procedure code and question code.
    /// Returns whether a row was created.
    async fn insert_question(&self, question: &ProcedureQuestion) -> Result<bool, StorageError>;
}

/// Lookup against the order/question/answer join.
#[async_trait]
pub trait QuestionLookup: Send + Sync {
    /// Number of active AOE questions on the order's procedures that have no answer yet.
    async fn unanswered_question_count(&self, order_id: i64) -> Result<u64, StorageError>;
}

/// Activation flags of host background services.
#[async_trait]
pub trait BackgroundServices: Send + Sync {
    async fn set_active(&self, name: &str, active: bool) -> Result<(), StorageError>;

    /// `None` when the service row is not registered.
    async fn is_active(&self, name: &str) -> Result<Option<bool>, StorageError>;
}

/// Site key material, stored by name.
#[async_trait]
pub trait KeyStore: Send + Sync {
    /// Encoded key value (hex or base64) registered under `name`.
    async fn key_value(&self, name: &str) -> Result<Option<String>, StorageError>;
}
