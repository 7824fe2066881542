use std::path::PathBuf;

use labhub_core::HubError;
use labhub_storage::StorageError;

/// Errors that abort a compendium operation.
///
/// Individual rows never produce one of these; they are counted and logged
/// by the importer instead.
#[derive(Debug, thiserror::Error)]
pub enum CompendiumError {
    #[error(transparent)]
    Hub(#[from] HubError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("File system error during {operation} at {}: {source}", path.display())]
    FileSystem {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract {}: {source}", path.display())]
    Extract {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },
}

impl CompendiumError {
    pub fn file_system(
        operation: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileSystem {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompendiumError>;
