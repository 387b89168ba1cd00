//! Builder for constructing Settings.

use super::{Arch, PipelineManifest, Settings, VersionPair};
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Values set explicitly (CLI flags or their environment equivalents) win
/// over the manifest, which wins over built-in defaults.
///
/// # Examples
///
/// ```no_run
/// use bundle_relocate::bundler::{SettingsBuilder, settings::VersionPair};
///
/// # fn example() -> bundle_relocate::bundler::Result<()> {
/// let settings = SettingsBuilder::new()
///     .source_dir(".")
///     .version(VersionPair { major: 4, minor: 1 })
///     .translations(true)
///     .build()?;
/// assert!(settings.bundle_path().ends_with("bin/App.app"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    manifest: Option<PipelineManifest>,
    version: Option<VersionPair>,
    source_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    dist_dir: Option<PathBuf>,
    toolkit_override: Option<PathBuf>,
    translations: bool,
    server: bool,
    skip_checks: bool,
    allow_distrusted_toolkit: bool,
    arch: Option<Arch>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the manifest. Default: [`PipelineManifest::default`].
    pub fn manifest(mut self, manifest: PipelineManifest) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Sets the version pair read from the build configuration.
    ///
    /// # Required
    pub fn version(mut self, version: VersionPair) -> Self {
        self.version = Some(version);
        self
    }

    /// Sets the source root.
    ///
    /// # Required
    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<source>/build`
    pub fn build_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Default: `<source>/dist`
    pub fn dist_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dist_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn toolkit_override(mut self, path: Option<PathBuf>) -> Self {
        self.toolkit_override = path;
        self
    }

    pub fn translations(mut self, enabled: bool) -> Self {
        self.translations = enabled;
        self
    }

    pub fn server(mut self, enabled: bool) -> Self {
        self.server = enabled;
        self
    }

    pub fn skip_checks(mut self, skip: bool) -> Self {
        self.skip_checks = skip;
        self
    }

    pub fn allow_distrusted_toolkit(mut self, allow: bool) -> Self {
        self.allow_distrusted_toolkit = allow;
        self
    }

    /// Overrides the manifest's `[build] arch`.
    pub fn arch(mut self, arch: Option<Arch>) -> Self {
        self.arch = arch;
        self
    }

    /// Builds the settings, absolutizing every directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `source_dir` or `version` is missing, or a path
    /// cannot be made absolute.
    pub fn build(self) -> crate::bundler::Result<Settings> {
        use crate::bundler::error::{Context, ErrorExt};

        let manifest = self.manifest.unwrap_or_default();
        let version = self.version.context("version is required")?;
        let source = self.source_dir.context("source_dir is required")?;
        let source_dir = source
            .absolutize()
            .fs_context("resolving source directory", &source)?
            .into_owned();

        let absolute = |path: Option<PathBuf>, default: &str| -> crate::bundler::Result<PathBuf> {
            let path = path.unwrap_or_else(|| source_dir.join(default));
            Ok(path
                .absolutize_from(&source_dir)
                .fs_context("resolving directory", &path)?
                .into_owned())
        };
        let build_dir = absolute(self.build_dir, "build")?;
        let dist_dir = absolute(self.dist_dir, "dist")?;

        let arch = self.arch.unwrap_or(manifest.build.arch);

        // relative overrides are taken from the invoking shell's directory
        let toolkit_override = match self.toolkit_override {
            Some(path) => Some(
                path.absolutize()
                    .fs_context("resolving toolkit override", &path)?
                    .into_owned(),
            ),
            None => None,
        };

        Ok(Settings::new(
            manifest,
            version,
            source_dir,
            build_dir,
            dist_dir,
            toolkit_override,
            self.translations,
            self.server,
            self.skip_checks,
            self.allow_distrusted_toolkit,
            arch,
        ))
    }
}
