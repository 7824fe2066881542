//! Compendium handling: the lab's catalog of orderable tests and their
//! Ask-at-Order-Entry questions.
//!
//! [`CompendiumSync`] lists the available archives, streams the full dataset
//! to a temp directory, extracts it and hands the two flat files to
//! [`CatalogImporter`]. Order codes are always imported before questions.

pub mod download;
pub mod error;
pub mod import;
pub mod listing;
pub mod parser;
pub mod sync;

pub use download::{download_to, extract_archive};
pub use error::{CompendiumError, Result};
pub use import::{CatalogImporter, ImportReport, PassStats, aoe_file_name, order_code_file_name};
pub use listing::{CompendiumCatalog, CompendiumFile, FULL_DATASET_MARKER, select_full_dataset};
pub use sync::{CompendiumSync, SyncReport};
