//! Catalog import from extracted compendium files.

use std::path::Path;

use labhub_core::{ProcedureQuestion, ProcedureType};
use labhub_storage::DynCatalogStore;
use tracing::{debug, error, info, warn};

use crate::error::{CompendiumError, Result};
use crate::parser::{self, ParsedLine};

pub fn order_code_file_name(receiver_id: &str) -> String {
    format!("ORDCODE_{receiver_id}.TXT")
}

pub fn aoe_file_name(receiver_id: &str) -> String {
    format!("AOE_{receiver_id}.TXT")
}

/// Counters for one pass over a compendium file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassStats {
    pub inserted: usize,
    /// Key already present; the existing row is kept
    pub duplicates: usize,
    pub inactive: usize,
    pub invalid: usize,
    /// Questions whose procedure code is not in the catalog
    pub unknown_procedure: usize,
    /// Rows the store rejected
    pub failed: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub order_codes: PassStats,
    pub questions: PassStats,
}

/// Loads order codes and AOE questions into a [`labhub_storage::CatalogStore`].
///
/// Row failures are logged and skipped so one bad line never costs the rest
/// of the catalog. A dataset group that cannot be created stops the pass,
/// since no order code can be stored without its parent.
#[derive(Clone)]
pub struct CatalogImporter {
    store: DynCatalogStore,
    lab_id: i64,
}

impl CatalogImporter {
    pub fn new(store: DynCatalogStore, lab_id: i64) -> Self {
        Self { store, lab_id }
    }

    pub async fn import_order_codes(&self, contents: &str) -> Result<PassStats> {
        let mut stats = PassStats::default();
        let mut group_id = None;

        for (line_no, line) in parser::data_lines(contents) {
            let record = match parser::parse_order_code(line) {
                ParsedLine::Record(record) => record,
                ParsedLine::Inactive => {
                    stats.inactive += 1;
                    continue;
                }
                ParsedLine::Invalid(reason) => {
                    debug!(line = line_no, reason, "Skipping order code line");
                    stats.invalid += 1;
                    continue;
                }
            };

            match self.store.procedure_code_exists(&record.procedure_code).await {
                Ok(true) => {
                    stats.duplicates += 1;
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(line = line_no, code = %record.procedure_code, error = %e, "Error importing order code");
                    stats.failed += 1;
                    continue;
                }
            }

            let parent = match group_id {
                Some(id) => id,
                None => match self.store.ensure_dataset_group(self.lab_id).await {
                    Ok(id) => *group_id.insert(id),
                    Err(e) => {
                        error!(line = line_no, error = %e, "Could not create dataset group");
                        return Err(CompendiumError::Storage(e));
                    }
                },
            };

            let procedure = ProcedureType {
                procedure_code: record.procedure_code,
                name: record.name,
                specimen: record.specimen,
                notes: record.notes,
                parent_group_id: parent,
                active: true,
            };
            match self.store.insert_procedure_type(self.lab_id, &procedure).await {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.duplicates += 1,
                Err(e) => {
                    warn!(line = line_no, code = %procedure.procedure_code, error = %e, "Error importing order code");
                    stats.failed += 1;
                }
            }
        }

        info!(
            inserted = stats.inserted,
            duplicates = stats.duplicates,
            inactive = stats.inactive,
            invalid = stats.invalid,
            failed = stats.failed,
            "Order codes imported"
        );
        Ok(stats)
    }

    /// Must run after [`CatalogImporter::import_order_codes`]: questions are
    /// only created for procedure codes already in the catalog.
    pub async fn import_questions(&self, contents: &str) -> PassStats {
        let mut stats = PassStats::default();

        for (line_no, line) in parser::data_lines(contents) {
            let record = match parser::parse_aoe(line) {
                ParsedLine::Record(record) => record,
                ParsedLine::Inactive => {
                    stats.inactive += 1;
                    continue;
                }
                ParsedLine::Invalid(reason) => {
                    debug!(line = line_no, reason, "Skipping AOE line");
                    stats.invalid += 1;
                    continue;
                }
            };

            match self.store.procedure_code_exists(&record.procedure_code).await {
                Ok(true) => {}
                Ok(false) => {
                    stats.unknown_procedure += 1;
                    continue;
                }
                Err(e) => {
                    warn!(line = line_no, code = %record.procedure_code, error = %e, "Error importing question");
                    stats.failed += 1;
                    continue;
                }
            }

            let question = ProcedureQuestion {
                lab_id: self.lab_id,
                procedure_code: record.procedure_code,
                question_code: record.question_code,
                text: record.text,
                tips: record.tips,
                field_type: record.field_type,
                active: true,
            };
            match self.store.insert_question(&question).await {
                Ok(true) => stats.inserted += 1,
                Ok(false) => stats.duplicates += 1,
                Err(e) => {
                    warn!(line = line_no, code = %question.question_code, error = %e, "Error importing question");
                    stats.failed += 1;
                }
            }
        }

        if stats.inserted > 0 {
            info!(count = stats.inserted, "Questions imported");
        }
        stats
    }

    /// Imports `ORDCODE_<receiver>.TXT` then `AOE_<receiver>.TXT` from `dir`,
    /// removing each file once its pass is done.
    ///
    /// A missing file aborts before any later pass runs.
    pub async fn import_directory(&self, dir: &Path, receiver_id: &str) -> Result<ImportReport> {
        let order_path = dir.join(order_code_file_name(receiver_id));
        let contents = read_compendium_file(&order_path).await?;
        let order_codes = self.import_order_codes(&contents).await?;
        remove_file(&order_path).await?;

        let aoe_path = dir.join(aoe_file_name(receiver_id));
        let contents = read_compendium_file(&aoe_path).await?;
        let questions = self.import_questions(&contents).await;
        remove_file(&aoe_path).await?;

        Ok(ImportReport {
            order_codes,
            questions,
        })
    }
}

impl std::fmt::Debug for CatalogImporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogImporter")
            .field("lab_id", &self.lab_id)
            .finish_non_exhaustive()
    }
}

async fn read_compendium_file(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Compendium file not available");
        CompendiumError::file_system("read compendium file", path, e)
    })?;
    // stray non-UTF-8 bytes are replaced, not fatal
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

async fn remove_file(path: &Path) -> Result<()> {
    tokio::fs::remove_file(path)
        .await
        .map_err(|e| CompendiumError::file_system("remove compendium file", path, e))
}
