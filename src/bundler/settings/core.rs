//! Core Settings struct and implementations.

use super::{Arch, PipelineManifest};
use std::fmt;
use std::path::{Path, PathBuf};

/// Application version pair read from the build configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VersionPair {
    pub major: u32,
    pub minor: u32,
}

impl fmt::Display for VersionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Immutable configuration for one pipeline run.
///
/// Built once at startup by [`SettingsBuilder`](super::SettingsBuilder) from
/// CLI flags, environment and the optional manifest, then handed to every
/// stage by reference. Nothing reads ambient environment after this point.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Manifest the run was configured from.
    manifest: PipelineManifest,

    /// Version pair used in the archive name.
    version: VersionPair,

    /// Source root (absolute).
    source_dir: PathBuf,

    /// Build output root (absolute).
    build_dir: PathBuf,

    /// Final artifact directory (absolute).
    dist_dir: PathBuf,

    /// Explicit toolkit root, highest-precedence locator source.
    toolkit_override: Option<PathBuf>,

    translations: bool,
    server: bool,

    /// Skip signature validation and the launch probe.
    skip_checks: bool,

    /// Accept a toolkit from a distrusted layout.
    allow_distrusted_toolkit: bool,

    arch: Arch,
}

impl Settings {
    /// Returns the application name (bundle name without `.app`).
    pub fn app_name(&self) -> &str {
        &self.manifest.app.name
    }

    /// Returns the CMake target producing the bundle.
    pub fn build_target(&self) -> &str {
        self.manifest
            .app
            .target
            .as_deref()
            .unwrap_or(&self.manifest.app.name)
    }

    pub fn version(&self) -> VersionPair {
        self.version
    }

    pub fn manifest(&self) -> &PipelineManifest {
        &self.manifest
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    pub fn dist_dir(&self) -> &Path {
        &self.dist_dir
    }

    pub fn toolkit_override(&self) -> Option<&Path> {
        self.toolkit_override.as_deref()
    }

    pub fn translations(&self) -> bool {
        self.translations
    }

    pub fn server(&self) -> bool {
        self.server
    }

    pub fn skip_checks(&self) -> bool {
        self.skip_checks
    }

    pub fn allow_distrusted_toolkit(&self) -> bool {
        self.allow_distrusted_toolkit
    }

    pub fn arch(&self) -> Arch {
        self.arch
    }

    /// Path prefixes classified as distrusted layouts.
    pub fn distrusted_prefixes(&self) -> &[String] {
        &self.manifest.toolkit.distrusted_prefixes
    }

    /// `<app>.app`
    pub fn bundle_file_name(&self) -> String {
        format!("{}.app", self.app_name())
    }

    /// Where the build is expected to leave the bundle: `<build-dir>/bin/<app>.app`.
    pub fn bundle_path(&self) -> PathBuf {
        self.build_dir.join("bin").join(self.bundle_file_name())
    }

    /// Scratch directory the archiver packages from.
    pub fn staging_dir(&self) -> PathBuf {
        self.build_dir.join("staging")
    }

    /// Final container name: `<app>-<major>.<minor>-macOS-internal.<ext>`.
    pub fn archive_file_name(&self, extension: &str) -> String {
        format!(
            "{}-{}-macOS-internal.{}",
            self.app_name(),
            self.version,
            extension
        )
    }

    /// Creates a new Settings instance (used by SettingsBuilder).
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        manifest: PipelineManifest,
        version: VersionPair,
        source_dir: PathBuf,
        build_dir: PathBuf,
        dist_dir: PathBuf,
        toolkit_override: Option<PathBuf>,
        translations: bool,
        server: bool,
        skip_checks: bool,
        allow_distrusted_toolkit: bool,
        arch: Arch,
    ) -> Self {
        Self {
            manifest,
            version,
            source_dir,
            build_dir,
            dist_dir,
            toolkit_override,
            translations,
            server,
            skip_checks,
            allow_distrusted_toolkit,
            arch,
        }
    }
}
