//! Build orchestration with CMake.
//!
//! Configures and builds exactly one target, the application bundle, with a
//! fixed option set. Failures are source-level almost always, so nothing here
//! retries.

use crate::bundler::tools::process;
use crate::bundler::{Error, Result, Settings, toolkit::ToolkitRoot};
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Budget for the configure step.
pub const CONFIGURE_TIMEOUT: Duration = Duration::from_secs(600);

/// Budget for the compile step.
pub const BUILD_TIMEOUT: Duration = Duration::from_secs(3600);

fn on_off(enabled: bool) -> &'static str {
    if enabled { "ON" } else { "OFF" }
}

/// Arguments for `cmake` configure.
pub fn configure_args(settings: &Settings, toolkit: &ToolkitRoot) -> Vec<String> {
    let build = &settings.manifest().build;
    vec![
        "-S".to_string(),
        settings.source_dir().display().to_string(),
        "-B".to_string(),
        settings.build_dir().display().to_string(),
        "-DCMAKE_BUILD_TYPE=Release".to_string(),
        format!("-DCMAKE_PREFIX_PATH={}", toolkit.path().display()),
        format!(
            "-DCMAKE_OSX_ARCHITECTURES={}",
            settings.arch().cmake_architectures()
        ),
        format!(
            "-D{}={}",
            build.translations_option,
            on_off(settings.translations())
        ),
        format!("-D{}={}", build.server_option, on_off(settings.server())),
    ]
}

/// Arguments for `cmake --build`.
pub fn build_args(settings: &Settings) -> Vec<String> {
    vec![
        "--build".to_string(),
        settings.build_dir().display().to_string(),
        "--target".to_string(),
        settings.build_target().to_string(),
        "--config".to_string(),
        "Release".to_string(),
        "--parallel".to_string(),
    ]
}

async fn run_step(
    settings: &Settings,
    step: &'static str,
    args: Vec<String>,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<()> {
    log::info!("Running CMake {} step", step);
    let mut command = tokio::process::Command::new(&settings.manifest().build.cmake);
    command.args(&args).current_dir(settings.source_dir());

    let status = process::run_streaming(command, timeout, cancel).await?;
    if !status.success() {
        return Err(Error::BuildFailure {
            step,
            code: status.code(),
        });
    }
    Ok(())
}

/// Configures and builds the bundle target.
///
/// # Returns
///
/// Path of the produced bundle, `<build-dir>/bin/<app>.app`.
///
/// # Errors
///
/// - [`Error::BuildFailure`] if either step exits non-zero
/// - [`Error::MissingArtifact`] if the build succeeded without producing the bundle
pub async fn build_bundle(
    settings: &Settings,
    toolkit: &ToolkitRoot,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(settings.build_dir()).await?;

    run_step(
        settings,
        "configure",
        configure_args(settings, toolkit),
        CONFIGURE_TIMEOUT,
        cancel,
    )
    .await?;

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    run_step(settings, "build", build_args(settings), BUILD_TIMEOUT, cancel).await?;

    let bundle = settings.bundle_path();
    if !bundle.is_dir() {
        return Err(Error::MissingArtifact {
            what: "application bundle",
            expected: bundle,
        });
    }

    log::info!("✓ Built {}", bundle.display());
    Ok(bundle)
}
