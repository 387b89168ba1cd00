//! External source modules fetched before the build.
//!
//! This is the only network access in the pipeline. A module that is already
//! present on disk (a non-empty directory) is left alone.

use crate::bundler::settings::ExternalModule;
use crate::bundler::tools::process;
use crate::bundler::{Error, Result, error::ErrorExt};
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Clones can hang on a dead network; cap them.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(300);

/// Whether `module` still has to be fetched into `source_dir`.
pub fn needs_fetch(source_dir: &Path, module: &ExternalModule) -> bool {
    let dest = source_dir.join(&module.path);
    match std::fs::read_dir(&dest) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// Fetch every missing module with a shallow `git clone`.
///
/// Returns the number of modules fetched.
///
/// # Errors
///
/// [`Error::NetworkFetchFailure`] if a clone exits non-zero or times out.
pub async fn fetch_missing(
    source_dir: &Path,
    modules: &[ExternalModule],
    cancel: &CancellationToken,
) -> Result<usize> {
    let mut fetched = 0;

    for module in modules.iter().filter(|m| needs_fetch(source_dir, m)) {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let dest = source_dir.join(&module.path);
        log::info!("Fetching {} into {}", module.url, dest.display());

        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .fs_context("creating external module directory", parent)?;
        }
        // git refuses to clone into a non-empty directory but accepts an empty one
        if dest.is_dir() {
            tokio::fs::remove_dir(&dest)
                .await
                .fs_context("removing empty module directory", &dest)?;
        }

        let mut command = tokio::process::Command::new("git");
        command
            .args(["clone", "--depth=1", &module.url])
            .arg(&dest);

        let status = process::run_streaming(command, FETCH_TIMEOUT, cancel)
            .await
            .map_err(|e| match e {
                Error::Timeout { seconds, .. } => Error::NetworkFetchFailure {
                    url: module.url.clone(),
                    reason: format!("timed out after {seconds}s"),
                },
                other => other,
            })?;

        if !status.success() {
            // leave no half-cloned tree behind for the next run to trip over
            let _ = tokio::fs::remove_dir_all(&dest).await;
            return Err(Error::NetworkFetchFailure {
                url: module.url.clone(),
                reason: format!("git clone exited with {status}"),
            });
        }

        fetched += 1;
    }

    Ok(fetched)
}
