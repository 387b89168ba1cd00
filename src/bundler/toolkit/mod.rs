//! Toolkit resolution.
//!
//! Finds exactly one usable Qt toolkit root per run and decides whether its
//! layout may be used. See [`ToolkitLocator`] for the precedence rules and
//! [`gate`] for the trust check that runs before anything is built.

mod layout;
mod locator;
mod package_manager;
mod version;

pub use layout::{LayoutClass, LayoutClassifier, PrefixClassifier};
pub use locator::{ToolkitLocator, gate, has_expected_layout};
pub use package_manager::{Homebrew, PackageManager};
pub use version::ToolkitVersion;

use std::fmt;
use std::path::{Path, PathBuf};

/// Where a toolkit root came from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ToolkitOrigin {
    /// `--qt-root` / `QT_ROOT`
    ExplicitOverride,
    /// The pinned, known-good package-manager install.
    PinnedPackageManager,
    /// Highest-versioned installer kit under the home directory.
    HomeDirectoryScan,
    /// Prefix reported by the package manager.
    PackageManagerQuery,
}

impl fmt::Display for ToolkitOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolkitOrigin::ExplicitOverride => "explicit override",
            ToolkitOrigin::PinnedPackageManager => "pinned package-manager install",
            ToolkitOrigin::HomeDirectoryScan => "installer kit",
            ToolkitOrigin::PackageManagerQuery => "package-manager query",
        };
        f.write_str(name)
    }
}

/// A resolved toolkit installation. Immutable once located.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToolkitRoot {
    path: PathBuf,
    origin: ToolkitOrigin,
    trust: LayoutClass,
    /// Accepted despite its layout class (the pinned install).
    implicitly_allowed: bool,
}

impl ToolkitRoot {
    pub fn new(path: PathBuf, origin: ToolkitOrigin, trust: LayoutClass) -> Self {
        let implicitly_allowed = origin == ToolkitOrigin::PinnedPackageManager;
        Self {
            path,
            origin,
            trust,
            implicitly_allowed,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn origin(&self) -> ToolkitOrigin {
        self.origin
    }

    pub fn trust(&self) -> LayoutClass {
        self.trust
    }

    pub fn implicitly_allowed(&self) -> bool {
        self.implicitly_allowed
    }

    /// Whether using this root needs the explicit opt-in flag.
    pub fn requires_opt_in(&self) -> bool {
        self.trust == LayoutClass::AllowedWithOverride && !self.implicitly_allowed
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.path.join("bin")
    }

    pub fn lib_dir(&self) -> PathBuf {
        self.path.join("lib")
    }

    /// The bundle deployer shipped with the toolkit.
    pub fn deployer(&self) -> PathBuf {
        self.bin_dir().join("macdeployqt")
    }
}
