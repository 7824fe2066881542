//! In-memory storage backend.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use labhub_core::{ProcedureQuestion, ProcedureType};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StorageError;
use crate::traits::{BackgroundServices, CatalogStore, KeyStore, QuestionLookup};

type QuestionKey = (i64, String, String);

/// A procedure type row with the columns the record itself does not carry.
#[derive(Debug, Clone)]
struct ProcedureRow {
    id: i64,
    lab_id: i64,
    record: ProcedureType,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    group_id: Option<i64>,
    // Keyed by code alone, matching the unique index on `ord` rows.
    procedure_types: BTreeMap<String, ProcedureRow>,
    questions: BTreeMap<QuestionKey, ProcedureQuestion>,
    order_codes: HashMap<i64, BTreeSet<String>>,
    answers: HashMap<i64, BTreeSet<String>>,
    services: HashMap<String, bool>,
    keys: HashMap<String, String>,
}

impl State {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Process-local storage. A single lock serializes writers, which makes
/// group creation atomic the same way the unique constraint does in SQL.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    state: RwLock<State>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `procedure_code` was ordered on `order_id`.
    pub async fn add_order_code(&self, order_id: i64, procedure_code: &str) {
        let mut state = self.state.write().await;
        state
            .order_codes
            .entry(order_id)
            .or_default()
            .insert(procedure_code.to_string());
    }

    /// Records an answer to `question_code` for `order_id`.
    pub async fn answer_question(&self, order_id: i64, question_code: &str) {
        let mut state = self.state.write().await;
        state
            .answers
            .entry(order_id)
            .or_default()
            .insert(question_code.to_string());
    }

    /// Snapshot of imported procedure types, ordered by code.
    pub async fn procedure_types(&self) -> Vec<ProcedureType> {
        self.state
            .read()
            .await
            .procedure_types
            .values()
            .map(|row| row.record.clone())
            .collect()
    }

    /// Row id and lab id stored for `procedure_code`.
    pub async fn procedure_row_ids(&self, procedure_code: &str) -> Option<(i64, i64)> {
        self.state
            .read()
            .await
            .procedure_types
            .get(procedure_code)
            .map(|row| (row.id, row.lab_id))
    }

    /// Snapshot of imported questions.
    pub async fn questions(&self) -> Vec<ProcedureQuestion> {
        self.state.read().await.questions.values().cloned().collect()
    }

    /// Registers an encoded key under `name`, replacing any previous value.
    pub async fn insert_key(&self, name: &str, value: &str) {
        self.state
            .write()
            .await
            .keys
            .insert(name.to_string(), value.to_string());
    }

    pub async fn dataset_group_id(&self) -> Option<i64> {
        self.state.read().await.group_id
    }
}

#[async_trait]
impl CatalogStore for InMemoryStorage {
    async fn ensure_dataset_group(&self, _lab_id: i64) -> Result<i64, StorageError> {
        let mut state = self.state.write().await;
        if let Some(id) = state.group_id {
            return Ok(id);
        }
        let id = state.allocate_id();
        state.group_id = Some(id);
        debug!(group_id = id, "Created dataset group");
        Ok(id)
    }

    async fn procedure_code_exists(&self, procedure_code: &str) -> Result<bool, StorageError> {
        Ok(self
            .state
            .read()
            .await
            .procedure_types
            .contains_key(procedure_code))
    }

    async fn insert_procedure_type(
        &self,
        lab_id: i64,
        record: &ProcedureType,
    ) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        if state.procedure_types.contains_key(&record.procedure_code) {
            return Ok(false);
        }
        let id = state.allocate_id();
        state.procedure_types.insert(
            record.procedure_code.clone(),
            ProcedureRow {
                id,
                lab_id,
                record: record.clone(),
            },
        );
        Ok(true)
    }

    async fn insert_question(&self, question: &ProcedureQuestion) -> Result<bool, StorageError> {
        let mut state = self.state.write().await;
        let key = (
            question.lab_id,
            question.procedure_code.clone(),
            question.question_code.clone(),
        );
        if state.questions.contains_key(&key) {
            return Ok(false);
        }
        state.questions.insert(key, question.clone());
        Ok(true)
    }
}

#[async_trait]
impl QuestionLookup for InMemoryStorage {
    async fn unanswered_question_count(&self, order_id: i64) -> Result<u64, StorageError> {
        let state = self.state.read().await;
        let Some(codes) = state.order_codes.get(&order_id) else {
            return Ok(0);
        };
        let answered = state.answers.get(&order_id);
        let count = state
            .questions
            .values()
            .filter(|q| q.active && codes.contains(&q.procedure_code))
            .filter(|q| !answered.is_some_and(|a| a.contains(&q.question_code)))
            .count();
        Ok(count as u64)
    }
}

#[async_trait]
impl BackgroundServices for InMemoryStorage {
    async fn set_active(&self, name: &str, active: bool) -> Result<(), StorageError> {
        self.state
            .write()
            .await
            .services
            .insert(name.to_string(), active);
        Ok(())
    }

    async fn is_active(&self, name: &str) -> Result<Option<bool>, StorageError> {
        Ok(self.state.read().await.services.get(name).copied())
    }
}

#[async_trait]
impl KeyStore for InMemoryStorage {
    async fn key_value(&self, name: &str) -> Result<Option<String>, StorageError> {
        Ok(self.state.read().await.keys.get(name).cloned())
    }
}
