//! Bundle deployment with `macdeployqt`.
//!
//! The deployer copies the toolkit's frameworks and plugins into the bundle
//! and rewrites most load paths. It does not discover library locations on
//! its own, so every plausible provider directory is passed explicitly.
//!
//! Its exit status is advisory: it can fail after a useful partial copy, or
//! succeed while leaving dangling references. A non-zero exit becomes a
//! [`PipelineWarning::Deployment`] and the rewriter and verifier decide.

use crate::bundler::builder::PipelineWarning;
use crate::bundler::tools::process;
use crate::bundler::{Result, Settings, toolkit::ToolkitRoot};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Budget for one deployer run.
pub const DEPLOY_TIMEOUT: Duration = Duration::from_secs(900);

/// Every existing directory the deployer should search for libraries.
///
/// Order: toolkit `lib`, the build tree's `lib`, manifest extras, then
/// package-manager locations (glob-expanded). Duplicates are dropped.
pub fn library_search_paths(settings: &Settings, toolkit: &ToolkitRoot) -> Vec<PathBuf> {
    let deploy = &settings.manifest().deploy;

    let mut candidates = vec![toolkit.lib_dir(), settings.build_dir().join("lib")];
    candidates.extend(
        deploy
            .library_paths
            .iter()
            .map(|p| settings.source_dir().join(p)),
    );

    for pattern in &deploy.package_manager_library_globs {
        match glob::glob(pattern) {
            Ok(entries) => candidates.extend(entries.flatten()),
            Err(e) => log::warn!("Ignoring invalid library glob {}: {}", pattern, e),
        }
    }

    let mut paths: Vec<PathBuf> = Vec::new();
    for candidate in candidates {
        if candidate.is_dir() && !paths.contains(&candidate) {
            paths.push(candidate);
        }
    }
    paths
}

/// Full argument list for the deployer.
pub fn deployer_args(bundle: &Path, qml_dir: &Path, library_paths: &[PathBuf]) -> Vec<String> {
    let mut args = vec![
        bundle.display().to_string(),
        format!("-qmldir={}", qml_dir.display()),
        "-always-overwrite".to_string(),
        "-verbose=1".to_string(),
    ];
    args.extend(
        library_paths
            .iter()
            .map(|p| format!("-libpath={}", p.display())),
    );
    args
}

/// Runs the deployer against `bundle`.
///
/// # Returns
///
/// `Some(warning)` when the deployer exited non-zero, `None` otherwise. The
/// bundle is left in whatever state the deployer produced either way.
///
/// # Errors
///
/// Only when the deployer cannot be started, hangs past [`DEPLOY_TIMEOUT`],
/// or the run is cancelled.
pub async fn deploy_bundle(
    settings: &Settings,
    toolkit: &ToolkitRoot,
    bundle: &Path,
    cancel: &CancellationToken,
) -> Result<Option<PipelineWarning>> {
    let library_paths = library_search_paths(settings, toolkit);
    log::info!(
        "Deploying {} with {} library search path(s)",
        bundle.display(),
        library_paths.len()
    );
    for path in &library_paths {
        log::debug!("  -libpath={}", path.display());
    }

    let qml_dir = settings.source_dir().join(&settings.manifest().deploy.qml_dir);
    let mut command = tokio::process::Command::new(toolkit.deployer());
    command.args(deployer_args(bundle, &qml_dir, &library_paths));

    let status = process::run_streaming(command, DEPLOY_TIMEOUT, cancel).await?;
    if status.success() {
        log::info!("✓ Deployer finished");
        return Ok(None);
    }

    let warning = PipelineWarning::Deployment {
        code: status.code(),
    };
    log::warn!("{}", warning);
    Ok(Some(warning))
}
