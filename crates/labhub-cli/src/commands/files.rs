use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};
use labhub_results::{ResultDecryptor, list_result_files};

use crate::output::{print_result_files, print_success, print_warning};

pub async fn list(dir: &Path) -> Result<()> {
    let files = list_result_files(dir)
        .await
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    print_result_files(&files);
    Ok(())
}

pub async fn decrypt(decryptor: &ResultDecryptor, input: &Path, output: Option<&Path>) -> Result<()> {
    let bytes = decrypt_file(decryptor, input).await?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &bytes)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            print_success(&format!(
                "Decrypted {} to {} ({} bytes)",
                input.display(),
                path.display(),
                bytes.len()
            ));
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(&bytes).context("Failed to write to stdout")?;
            stdout.flush().context("Failed to write to stdout")?;
        }
    }
    Ok(())
}

async fn decrypt_file(decryptor: &ResultDecryptor, input: &Path) -> Result<Vec<u8>> {
    if !input.is_file() {
        bail!("Input file not found: {}", input.display());
    }
    let raw = tokio::fs::read(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let decrypted = decryptor
        .decrypt(&raw)
        .await
        .with_context(|| format!("Failed to decrypt {}", input.display()))?;
    if decrypted.is_warning() {
        print_warning("Drive encryption is disabled, content returned unchanged");
    }
    if decrypted.bytes.is_empty() {
        bail!("Decrypting {} produced no content", input.display());
    }
    Ok(decrypted.bytes)
}
