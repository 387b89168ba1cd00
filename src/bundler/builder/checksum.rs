//! SHA-256 digests for the final container and for bundle trees.
//!
//! Directory digests cover each regular file's relative path and contents
//! in sorted order, so two bundles hash equal exactly when their files do.
//! Symlinks are skipped.

use crate::{bail, bundler::Result, bundler::error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hex-encoded SHA-256 of a file or a directory tree.
pub async fn calculate_sha256(path: &Path) -> Result<String> {
    let metadata = tokio::fs::metadata(path)
        .await
        .fs_context("reading metadata", path)?;

    let mut hasher = Sha256::new();
    if metadata.is_file() {
        hash_file(path, &mut hasher).await?;
    } else if metadata.is_dir() {
        let mut files = Vec::new();
        for entry in walkdir::WalkDir::new(path).follow_links(false) {
            let entry = entry?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
        files.sort();

        for file in files {
            let relative = file.strip_prefix(path)?;
            hasher.update(relative.to_string_lossy().as_bytes());
            hash_file(&file, &mut hasher).await?;
        }
    } else {
        bail!("{} is neither a file nor a directory", path.display());
    }

    Ok(format!("{:x}", hasher.finalize()))
}

async fn hash_file(path: &Path, hasher: &mut Sha256) -> Result<()> {
    let mut file = tokio::fs::File::open(path)
        .await
        .fs_context("opening file for hashing", path)?;
    let mut buffer = vec![0u8; 8192];
    loop {
        let n = file
            .read(&mut buffer)
            .await
            .fs_context("reading file for hashing", path)?;
        if n == 0 {
            return Ok(());
        }
        hasher.update(&buffer[..n]);
    }
}
