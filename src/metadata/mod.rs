//! Build configuration metadata: the pipeline manifest and the version pair.

use crate::bundler::settings::{PipelineManifest, VersionPair};
use crate::error::{BundlerError, CliError, Result};
use regex::Regex;
use std::path::Path;

/// Manifest file looked up in the source root when `--config` is not given.
pub const DEFAULT_MANIFEST: &str = "bundle.toml";

/// Load the pipeline manifest.
///
/// A missing file at the default location means "use defaults"; a missing
/// file that was asked for explicitly is an error.
pub fn load_manifest(path: &Path, explicit: bool) -> Result<PipelineManifest> {
    if !path.exists() {
        if explicit {
            return Err(BundlerError::Cli(CliError::InvalidArguments {
                reason: format!("config file not found: {}", path.display()),
            }));
        }
        log::debug!("No manifest at {}, using defaults", path.display());
        return Ok(PipelineManifest::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        BundlerError::Cli(CliError::ExecutionFailed {
            command: "read_manifest".to_string(),
            reason: format!("Failed to read {}: {}", path.display(), e),
        })
    })?;

    log::info!("Loaded manifest {}", path.display());
    Ok(toml::from_str(&contents)?)
}

/// Read `<PREFIX>_MAJOR_VERSION` and `<PREFIX>_MINOR_VERSION` from a CMake
/// build configuration.
///
/// Accepts `set(APP_MAJOR_VERSION 4)` with any casing of `set` and optional
/// quoting of the value.
pub fn load_version(cmake_lists: &Path, prefix: &str) -> Result<VersionPair> {
    let contents = std::fs::read_to_string(cmake_lists).map_err(|e| {
        BundlerError::Cli(CliError::ExecutionFailed {
            command: "read_build_configuration".to_string(),
            reason: format!("Failed to read {}: {}", cmake_lists.display(), e),
        })
    })?;

    parse_version(&contents, prefix).ok_or_else(|| {
        BundlerError::Cli(CliError::InvalidArguments {
            reason: format!(
                "{} does not set {prefix}_MAJOR_VERSION and {prefix}_MINOR_VERSION",
                cmake_lists.display()
            ),
        })
    })
}

fn parse_version(contents: &str, prefix: &str) -> Option<VersionPair> {
    let component = |name: &str| -> Option<u32> {
        let pattern = format!(
            r#"(?im)^\s*set\s*\(\s*{}_{}_VERSION\s+"?(\d+)"?\s*\)"#,
            regex::escape(prefix),
            name
        );
        let re = Regex::new(&pattern).ok()?;
        re.captures(contents)?.get(1)?.as_str().parse().ok()
    };

    Some(VersionPair {
        major: component("MAJOR")?,
        minor: component("MINOR")?,
    })
}
