//! Toolkit root resolution with precedence rules.

use super::{
    LayoutClass, LayoutClassifier, PackageManager, ToolkitOrigin, ToolkitRoot, ToolkitVersion,
};
use crate::bundler::{Error, Result, Settings};
use std::path::{Path, PathBuf};

/// Installer kits live at `~/<home_directory>/<version>/macos`.
const KIT_PLATFORM_DIR: &str = "macos";

/// Whether `root` has the layout the deployer and build expect.
pub fn has_expected_layout(root: &Path) -> bool {
    root.join("bin").join("macdeployqt").is_file()
        && root.join("lib").join("QtCore.framework").is_dir()
}

/// Resolves one [`ToolkitRoot`] per run.
///
/// First match wins:
///
/// 1. explicit override, used verbatim (must exist)
/// 2. pinned package-manager path, implicitly allowed
/// 3. highest-versioned installer kit under the home directory
/// 4. package-manager query, accepted only with the expected layout
pub struct ToolkitLocator<'a> {
    settings: &'a Settings,
    package_manager: &'a dyn PackageManager,
    classifier: &'a dyn LayoutClassifier,
    home: Option<PathBuf>,
}

impl<'a> ToolkitLocator<'a> {
    pub fn new(
        settings: &'a Settings,
        package_manager: &'a dyn PackageManager,
        classifier: &'a dyn LayoutClassifier,
    ) -> Self {
        Self {
            settings,
            package_manager,
            classifier,
            home: dirs::home_dir(),
        }
    }

    /// Replaces the home directory scanned for installer kits.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = home;
        self
    }

    fn root(&self, path: PathBuf, origin: ToolkitOrigin) -> ToolkitRoot {
        let trust = self.classifier.classify(&path);
        log::info!(
            "Using Qt toolkit at {} ({}, {:?})",
            path.display(),
            origin,
            trust
        );
        ToolkitRoot::new(path, origin, trust)
    }

    /// Runs the resolution order.
    ///
    /// # Errors
    ///
    /// [`Error::ToolkitUnresolved`] listing every source tried.
    pub fn locate(&self) -> Result<ToolkitRoot> {
        let mut attempted = Vec::new();

        if let Some(path) = self.settings.toolkit_override() {
            if path.exists() {
                return Ok(self.root(path.to_path_buf(), ToolkitOrigin::ExplicitOverride));
            }
            attempted.push(format!("QT_ROOT={} (does not exist)", path.display()));
            return Err(Error::ToolkitUnresolved { attempted });
        }
        attempted.push("QT_ROOT (unset)".to_string());

        let toolkit = &self.settings.manifest().toolkit;

        match &toolkit.pinned_root {
            Some(pinned) if pinned.is_dir() => {
                return Ok(self.root(pinned.clone(), ToolkitOrigin::PinnedPackageManager));
            }
            Some(pinned) => attempted.push(format!("{} (not installed)", pinned.display())),
            None => {}
        }

        match &self.home {
            Some(home) => {
                let kits_dir = home.join(&toolkit.home_directory);
                if let Some(kit) = newest_kit(&kits_dir) {
                    return Ok(self.root(kit, ToolkitOrigin::HomeDirectoryScan));
                }
                attempted.push(format!(
                    "{}/<version>/{} (no kits found)",
                    kits_dir.display(),
                    KIT_PLATFORM_DIR
                ));
            }
            None => attempted.push("home directory (unknown)".to_string()),
        }

        let manager = self.package_manager.name();
        match self.package_manager.query_prefix(&toolkit.package) {
            Some(prefix) if has_expected_layout(&prefix) => {
                return Ok(self.root(prefix, ToolkitOrigin::PackageManagerQuery));
            }
            Some(prefix) => attempted.push(format!(
                "{} --prefix {} -> {} (missing bin/macdeployqt or lib/QtCore.framework)",
                manager,
                toolkit.package,
                prefix.display()
            )),
            None => attempted.push(format!(
                "{} --prefix {} (not installed)",
                manager, toolkit.package
            )),
        }

        Err(Error::ToolkitUnresolved { attempted })
    }
}

/// Highest-versioned `<kits_dir>/<version>/macos` directory.
///
/// Only looks two levels deep; version directories are compared numerically.
fn newest_kit(kits_dir: &Path) -> Option<PathBuf> {
    if !kits_dir.is_dir() {
        return None;
    }

    walkdir::WalkDir::new(kits_dir)
        .min_depth(2)
        .max_depth(2)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.file_name() == KIT_PLATFORM_DIR)
        .filter_map(|e| {
            let version = e
                .path()
                .parent()?
                .file_name()?
                .to_str()?
                .parse::<ToolkitVersion>()
                .ok()?;
            Some((version, e.into_path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(version, path)| {
            log::debug!("Newest installer kit: {} at {}", version, path.display());
            path
        })
}

/// Refuses toolkit layouts the deployer cannot handle.
///
/// Runs before the build so a refused root leaves no build artifacts behind.
pub fn gate(root: &ToolkitRoot, allow_distrusted: bool) -> Result<()> {
    match root.trust() {
        LayoutClass::Preferred => Ok(()),
        LayoutClass::AllowedWithOverride if !root.requires_opt_in() => Ok(()),
        LayoutClass::AllowedWithOverride if allow_distrusted => {
            log::warn!(
                "Proceeding with distrusted toolkit layout at {}; deployment may be incomplete",
                root.path().display()
            );
            Ok(())
        }
        class => Err(Error::UntrustedLayout {
            root: root.path().to_path_buf(),
            class,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::toolkit::PrefixClassifier;

    #[test]
    fn newest_kit_uses_numeric_order() {
        let home = tempfile::tempdir().unwrap();
        for v in ["6.9.0", "6.10.0", "6.2.1"] {
            std::fs::create_dir_all(home.path().join("Qt").join(v).join("macos")).unwrap();
        }
        std::fs::create_dir_all(home.path().join("Qt/Tools/macos")).unwrap();

        let kit = newest_kit(&home.path().join("Qt")).unwrap();
        assert!(kit.ends_with("Qt/6.10.0/macos"));
    }

    #[test]
    fn newest_kit_ignores_versions_without_platform_dir() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(home.path().join("Qt/6.12.0/ios")).unwrap();
        std::fs::create_dir_all(home.path().join("Qt/6.5.3/macos")).unwrap();

        let kit = newest_kit(&home.path().join("Qt")).unwrap();
        assert!(kit.ends_with("Qt/6.5.3/macos"));
    }

    #[test]
    fn gate_blocks_distrusted_without_flag() {
        let classifier = PrefixClassifier::new(&["/opt/homebrew".to_string()]);
        let path = PathBuf::from("/opt/homebrew/opt/qt");
        let root = ToolkitRoot::new(
            path.clone(),
            ToolkitOrigin::PackageManagerQuery,
            classifier.classify(&path),
        );
        assert!(matches!(
            gate(&root, false),
            Err(Error::UntrustedLayout { .. })
        ));
        assert!(gate(&root, true).is_ok());
    }

    #[test]
    fn gate_passes_pinned_install() {
        let root = ToolkitRoot::new(
            PathBuf::from("/opt/homebrew/Cellar/qt/6.7.3"),
            ToolkitOrigin::PinnedPackageManager,
            LayoutClass::AllowedWithOverride,
        );
        assert!(gate(&root, false).is_ok());
    }

    #[test]
    fn gate_never_accepts_unsupported() {
        let root = ToolkitRoot::new(
            PathBuf::from("relative/qt"),
            ToolkitOrigin::ExplicitOverride,
            LayoutClass::Unsupported,
        );
        assert!(gate(&root, true).is_err());
    }
}
