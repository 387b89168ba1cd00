//! Single-file containers for the staged bundle.

use super::{ImageArchiver, process};
use crate::bundler::{Error, Result, error::ErrorExt};
use flate2::{Compression, write::GzEncoder};
use std::path::Path;
use std::process::Command;
use std::time::Duration;

/// `hdiutil` can take a while on large bundles.
const HDIUTIL_TIMEOUT: Duration = Duration::from_secs(600);

/// Compressed read-only disk image (UDZO) created with `hdiutil`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Hdiutil;

impl ImageArchiver for Hdiutil {
    fn extension(&self) -> &str {
        "dmg"
    }

    fn create(&self, volume_name: &str, source: &Path, destination: &Path) -> Result<()> {
        let mut command = Command::new("hdiutil");
        command
            .args(["create", "-volname", volume_name, "-srcfolder"])
            .arg(source)
            .args(["-ov", "-format", "UDZO"])
            .arg(destination);

        let output = process::run(command, HDIUTIL_TIMEOUT)?;
        if !output.success() {
            return Err(Error::GenericError(format!(
                "hdiutil failed: {}",
                output.stderr.trim()
            )));
        }
        Ok(())
    }

    fn program(&self) -> Option<&str> {
        Some("hdiutil")
    }
}

/// Gzip-compressed tarball, used where `hdiutil` is unavailable.
///
/// Symlinks (the `Applications` shortcut, framework `Versions/Current`) are
/// stored as links, not followed.
#[derive(Debug, Default, Clone, Copy)]
pub struct Tarball;

impl ImageArchiver for Tarball {
    fn extension(&self) -> &str {
        "tar.gz"
    }

    fn create(&self, volume_name: &str, source: &Path, destination: &Path) -> Result<()> {
        let file = std::fs::File::create(destination)
            .fs_context("creating archive", destination)?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));
        builder.follow_symlinks(false);
        builder
            .append_dir_all(volume_name, source)
            .fs_context("archiving staging directory", source)?;
        builder
            .into_inner()
            .and_then(|encoder| encoder.finish())
            .fs_context("finishing archive", destination)?;
        Ok(())
    }
}
