//! Directory listing with a best-effort encryption hint per file.

use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tokio::io::AsyncReadExt;
use tracing::warn;

use crate::envelope::{MARKER_LEN, sniff_version};
use crate::error::{DecryptError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultFile {
    pub path: PathBuf,
    pub name: String,
    pub size: u64,
    pub modified: Option<OffsetDateTime>,
    /// `Some(n)` when the file starts with an `00n` marker. Advisory only.
    pub encryption_version: Option<u8>,
}

impl ResultFile {
    pub fn status_label(&self) -> String {
        match self.encryption_version {
            Some(v) => format!("encrypted (v{v})"),
            None => "plaintext".to_string(),
        }
    }
}

/// Regular files in `dir`, newest first.
pub async fn list_result_files(dir: &Path) -> Result<Vec<ResultFile>> {
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| DecryptError::io("read directory", dir, e))?;

    let mut files = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| DecryptError::io("read directory", dir, e))?
    {
        let path = entry.path();
        let metadata = entry
            .metadata()
            .await
            .map_err(|e| DecryptError::io("stat", &path, e))?;
        if !metadata.is_file() {
            continue;
        }
        let encryption_version = encryption_hint(&path).await;
        files.push(ResultFile {
            name: entry.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified: metadata.modified().ok().map(OffsetDateTime::from),
            encryption_version,
            path,
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// A file that cannot be read is listed as plaintext rather than failing the listing.
async fn encryption_hint(path: &Path) -> Option<u8> {
    match read_marker(path).await {
        Ok(version) => version,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not read file marker");
            None
        }
    }
}

async fn read_marker(path: &Path) -> Result<Option<u8>> {
    let mut file = tokio::fs::File::open(path)
        .await
        .map_err(|e| DecryptError::io("open", path, e))?;
    let mut head = Vec::with_capacity(MARKER_LEN);
    (&mut file)
        .take(MARKER_LEN as u64)
        .read_to_end(&mut head)
        .await
        .map_err(|e| DecryptError::io("read", path, e))?;
    Ok(sniff_version(&head))
}
