//! Streaming download and extraction of compendium archives.

use std::path::{Path, PathBuf};

use labhub_client::HttpGateway;
use labhub_core::HubError;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::error::{CompendiumError, Result};

/// Streams the resource at `retrieve_uri` into `dest` without buffering the
/// whole archive. Returns the number of bytes written.
///
/// Bytes land in `<dest>.part` first and are renamed into place once the
/// stream completes, so `dest` never holds a truncated archive.
pub async fn download_to(gateway: &HttpGateway, retrieve_uri: &str, dest: &Path) -> Result<u64> {
    let resp = gateway.get_response(retrieve_uri).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CompendiumError::file_system("create temp directory", parent, e))?;
    }
    let part = part_path(dest);
    let written = match stream_into(resp, &part).await {
        Ok(written) => written,
        Err(e) => {
            if let Err(rm) = tokio::fs::remove_file(&part).await {
                warn!(path = %part.display(), error = %rm, "Could not remove partial archive");
            }
            return Err(e);
        }
    };
    tokio::fs::rename(&part, dest)
        .await
        .map_err(|e| CompendiumError::file_system("move archive into place", dest, e))?;

    info!(path = %dest.display(), bytes = written, "Compendium archive downloaded");
    Ok(written)
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}

async fn stream_into(mut resp: reqwest::Response, part: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| CompendiumError::file_system("create archive file", part, e))?;

    let mut written = 0u64;
    while let Some(chunk) = resp
        .chunk()
        .await
        .map_err(|e| HubError::transport("compendium download interrupted", e))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| CompendiumError::file_system("write archive file", part, e))?;
        written += chunk.len() as u64;
    }
    file.flush()
        .await
        .map_err(|e| CompendiumError::file_system("write archive file", part, e))?;
    Ok(written)
}

/// Unpacks `archive` into `dest`. Entries that would escape `dest` are rejected.
pub async fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let archive = archive.to_path_buf();
    let dest = dest.to_path_buf();
    let path_for_join = archive.clone();

    tokio::task::spawn_blocking(move || extract_blocking(&archive, &dest))
        .await
        .map_err(|e| {
            CompendiumError::file_system("extract archive", path_for_join, std::io::Error::other(e))
        })?
}

fn extract_blocking(archive: &Path, dest: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)
        .map_err(|e| CompendiumError::file_system("open archive", archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| CompendiumError::Extract {
        path: archive.to_path_buf(),
        source,
    })?;
    let entries = zip.len();
    zip.extract(dest).map_err(|source| CompendiumError::Extract {
        path: archive.to_path_buf(),
        source,
    })?;
    debug!(archive = %archive.display(), entries, "Archive extracted");
    Ok(())
}
