//! PostgreSQL implementation of the lab hub storage traits.

use async_trait::async_trait;
use labhub_core::{DATASET_GROUP_NAME, ProcedureQuestion, ProcedureType};
use labhub_storage::{BackgroundServices, CatalogStore, KeyStore, QuestionLookup, StorageError};
use sqlx_postgres::PgPool;
use tracing::{debug, info, instrument};

use crate::config::PostgresConfig;
use crate::error::query_error;
use crate::migrations;
use crate::pool;

const ORDERABLE_TYPE: &str = "ord";
const GROUP_TYPE: &str = "grp";
const LABORATORY_TEST: &str = "laboratory_test";

/// PostgreSQL storage backend for the compendium catalog and host lookups.
#[derive(Debug, Clone)]
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connects and, when configured, applies the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be created or a migration fails.
    pub async fn new(config: PostgresConfig) -> Result<Self, StorageError> {
        let pool = pool::create_pool(&config).await?;

        if config.run_migrations {
            migrations::run(&pool).await?;
        }

        Ok(Self { pool })
    }

    /// Wraps an existing pool. Migrations are not run.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn activity(active: bool) -> i16 {
    i16::from(active)
}

#[async_trait]
impl CatalogStore for PostgresStorage {
    #[instrument(skip(self))]
    async fn ensure_dataset_group(&self, lab_id: i64) -> Result<i64, StorageError> {
        // Concurrent first runs race on the partial unique index; the loser
        // inserts nothing and reads the winner's row.
        let inserted: Option<(i64,)> = sqlx_core::query_as::query_as(
            r#"
            INSERT INTO procedure_type (parent, name, lab_id, procedure_type, activity)
            VALUES (0, $1, $2, $3, 1)
            ON CONFLICT (name) WHERE procedure_type = 'grp' AND parent = 0 DO NOTHING
            RETURNING procedure_type_id
            "#,
        )
        .bind(DATASET_GROUP_NAME)
        .bind(lab_id)
        .bind(GROUP_TYPE)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?;

        if let Some((id,)) = inserted {
            info!(group_id = id, "Created dataset group");
            return Ok(id);
        }

        let (id,): (i64,) = sqlx_core::query_as::query_as(
            r#"
            SELECT procedure_type_id FROM procedure_type
            WHERE name = $1 AND procedure_type = 'grp' AND parent = 0
            "#,
        )
        .bind(DATASET_GROUP_NAME)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        debug!(group_id = id, "Dataset group already present");
        Ok(id)
    }

    async fn procedure_code_exists(&self, procedure_code: &str) -> Result<bool, StorageError> {
        let (exists,): (bool,) = sqlx_core::query_as::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM procedure_type
                WHERE procedure_code = $1 AND procedure_type = 'ord'
            )
            "#,
        )
        .bind(procedure_code)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(exists)
    }

    async fn insert_procedure_type(
        &self,
        lab_id: i64,
        record: &ProcedureType,
    ) -> Result<bool, StorageError> {
        let result = sqlx_core::query::query(
            r#"
            INSERT INTO procedure_type
                (parent, name, lab_id, procedure_code, procedure_type,
                 procedure_type_name, specimen, notes, activity)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (procedure_code) WHERE procedure_type = 'ord' DO NOTHING
            "#,
        )
        .bind(record.parent_group_id)
        .bind(&record.name)
        .bind(lab_id)
        .bind(&record.procedure_code)
        .bind(ORDERABLE_TYPE)
        .bind(LABORATORY_TEST)
        .bind(&record.specimen)
        .bind(&record.notes)
        .bind(activity(record.active))
        .execute(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(result.rows_affected() == 1)
    }

    async fn insert_question(&self, question: &ProcedureQuestion) -> Result<bool, StorageError> {
        let result = sqlx_core::query::query(
            r#"
            INSERT INTO procedure_questions
                (lab_id, procedure_code, question_code, question_text, tips, fldtype, activity)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (lab_id, procedure_code, question_code) DO NOTHING
            "#,
        )
        .bind(question.lab_id)
        .bind(&question.procedure_code)
        .bind(&question.question_code)
        .bind(&question.text)
        .bind(&question.tips)
        .bind(question.field_type.as_code())
        .bind(activity(question.active))
        .execute(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl QuestionLookup for PostgresStorage {
    async fn unanswered_question_count(&self, order_id: i64) -> Result<u64, StorageError> {
        let (count,): (i64,) = sqlx_core::query_as::query_as(
            r#"
            SELECT COUNT(*)
            FROM procedure_order_code poc
            JOIN procedure_questions pq
                ON pq.procedure_code = poc.procedure_code AND pq.activity = 1
            LEFT JOIN procedure_answers pa
                ON pa.procedure_order_id = poc.procedure_order_id
               AND pa.procedure_order_seq = poc.procedure_order_seq
               AND pa.question_code = pq.question_code
            WHERE poc.procedure_order_id = $1 AND pa.question_code IS NULL
            "#,
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl BackgroundServices for PostgresStorage {
    async fn set_active(&self, name: &str, active: bool) -> Result<(), StorageError> {
        sqlx_core::query::query(
            r#"
            INSERT INTO background_services (name, title, active)
            VALUES ($1, $1, $2)
            ON CONFLICT (name) DO UPDATE SET active = EXCLUDED.active
            "#,
        )
        .bind(name)
        .bind(active)
        .execute(&self.pool)
        .await
        .map_err(query_error)?;
        info!(service = name, active, "Updated background service");
        Ok(())
    }

    async fn is_active(&self, name: &str) -> Result<Option<bool>, StorageError> {
        let row: Option<(bool,)> =
            sqlx_core::query_as::query_as("SELECT active FROM background_services WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error)?;
        Ok(row.map(|(active,)| active))
    }
}

#[async_trait]
impl KeyStore for PostgresStorage {
    async fn key_value(&self, name: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> =
            sqlx_core::query_as::query_as("SELECT value FROM keys WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await
                .map_err(query_error)?;
        Ok(row.map(|(value,)| value))
    }
}
