//! Filesystem helpers shared by the staging and packaging steps.
//!
//! All helpers are idempotent with respect to "already there" / "already
//! gone", and directory copies keep symlinks as symlinks so framework
//! `Versions/Current` aliases survive staging.

use crate::bundler::error::{Error, ErrorExt, Result};
use std::io;
use std::path::Path;
use tokio::fs;

/// Creates `path` and its parents, optionally emptying it first.
pub async fn create_dir_all(path: &Path, erase: bool) -> Result<()> {
    if erase {
        remove_dir_all(path).await?;
    }
    fs::create_dir_all(path)
        .await
        .fs_context("creating directory", path)
}

/// Removes a directory tree. A missing directory is not an error.
pub async fn remove_dir_all(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).fs_context("removing directory", path),
    }
}

#[cfg(unix)]
fn copy_symlink(target: &Path, _is_dir: bool, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, dest)
}

#[cfg(windows)]
fn copy_symlink(target: &Path, is_dir: bool, dest: &Path) -> io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, dest)
    } else {
        std::os::windows::fs::symlink_file(target, dest)
    }
}

/// Recursively copies the directory `from` to `to`, preserving symlinks and
/// file modes.
///
/// Fails if `from` is not a directory.
pub async fn copy_dir(from: &Path, to: &Path) -> Result<()> {
    if !from.is_dir() {
        return Err(Error::GenericError(format!(
            "{} is not a directory",
            from.display()
        )));
    }

    let from = from.to_path_buf();
    let to = to.to_path_buf();

    tokio::task::spawn_blocking(move || -> Result<()> {
        if let Some(parent) = to.parent() {
            std::fs::create_dir_all(parent).fs_context("creating directory", parent)?;
        }

        for entry in walkdir::WalkDir::new(&from).follow_links(false) {
            let entry = entry?;
            let dest = to.join(entry.path().strip_prefix(&from)?);

            if entry.file_type().is_symlink() {
                let target =
                    std::fs::read_link(entry.path()).fs_context("reading symlink", entry.path())?;
                copy_symlink(&target, entry.path().is_dir(), &dest)
                    .fs_context("creating symlink", &dest)?;
            } else if entry.file_type().is_dir() {
                std::fs::create_dir_all(&dest).fs_context("creating directory", &dest)?;
            } else {
                std::fs::copy(entry.path(), &dest).fs_context("copying file", entry.path())?;
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("directory copy task failed: {e}")))?
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;

    #[tokio::test]
    async fn copy_keeps_symlinks_and_modes() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("QtCore.framework");
        std::fs::create_dir_all(src.join("Versions/A")).unwrap();
        std::fs::write(src.join("Versions/A/QtCore"), b"bin").unwrap();
        std::fs::set_permissions(
            src.join("Versions/A/QtCore"),
            std::fs::Permissions::from_mode(0o755),
        )
        .unwrap();
        std::os::unix::fs::symlink("A", src.join("Versions/Current")).unwrap();

        let dst = dir.path().join("out/QtCore.framework");
        copy_dir(&src, &dst).await.unwrap();

        assert_eq!(
            std::fs::read_link(dst.join("Versions/Current")).unwrap(),
            Path::new("A")
        );
        let mode = std::fs::metadata(dst.join("Versions/A/QtCore"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[tokio::test]
    async fn erase_and_remove_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("staging");
        remove_dir_all(&target).await.unwrap();
        create_dir_all(&target, true).await.unwrap();
        std::fs::write(target.join("old"), b"").unwrap();
        create_dir_all(&target, true).await.unwrap();
        assert!(!target.join("old").exists());
    }
}
