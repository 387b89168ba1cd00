//! Staging and packaging.
//!
//! Every run starts from an emptied staging directory and overwrites any
//! previous container of the same name.

use crate::bundler::{
    Error, Settings,
    error::{Context, ErrorExt, Result},
    tools::ImageArchiver,
    utils::fs,
};
use std::path::{Path, PathBuf};

/// Name of the drag-to-install shortcut inside the staging directory.
pub const APPLICATIONS_LINK: &str = "Applications";

/// Copies `bundle` into a fresh staging directory next to an
/// `Applications -> /Applications` symlink.
///
/// Returns the staging directory.
pub async fn stage_bundle(settings: &Settings, bundle: &Path) -> Result<PathBuf> {
    let staging = settings.staging_dir();
    fs::create_dir_all(&staging, true).await?;

    let bundle_name = bundle
        .file_name()
        .with_context(|| format!("invalid bundle path: {}", bundle.display()))?;
    let staged_app = staging.join(bundle_name);

    log::debug!("Copying bundle to staging: {}", staged_app.display());
    fs::copy_dir(bundle, &staged_app)
        .await
        .with_context(|| format!("copying bundle to {}", staged_app.display()))?;

    #[cfg(unix)]
    {
        let link = staging.join(APPLICATIONS_LINK);
        std::os::unix::fs::symlink("/Applications", &link)
            .fs_context("creating Applications symlink", &link)?;
    }

    Ok(staging)
}

/// Stages `bundle` and packs it into
/// `<dist-dir>/<app>-<major>.<minor>-macOS-internal.<ext>`.
///
/// # Errors
///
/// [`Error::MissingArtifact`] if the archiver reports success but nothing
/// exists at the destination.
pub async fn create_archive(
    settings: &Settings,
    archiver: &dyn ImageArchiver,
    bundle: &Path,
) -> Result<PathBuf> {
    let staging = stage_bundle(settings, bundle).await?;

    fs::create_dir_all(settings.dist_dir(), false).await?;
    let destination = settings
        .dist_dir()
        .join(settings.archive_file_name(archiver.extension()));

    if destination.exists() {
        tokio::fs::remove_file(&destination)
            .await
            .fs_context("removing previous archive", &destination)?;
    }

    log::info!("Packaging {}", destination.display());
    archiver.create(settings.app_name(), &staging, &destination)?;

    if !destination.is_file() {
        return Err(Error::MissingArtifact {
            what: "archive",
            expected: destination,
        });
    }

    log::info!("✓ Created {}", destination.display());
    Ok(destination)
}
