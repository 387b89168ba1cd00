//! Pipeline manifest (`bundle.toml`).
//!
//! Every section is optional; missing keys fall back to the defaults below.
//!
//! ```toml
//! [app]
//! name = "GCompris"
//! version_variable_prefix = "GCOMPRIS"
//!
//! [toolkit]
//! pinned_root = "/opt/homebrew/Cellar/qt/6.7.3"
//! distrusted_prefixes = ["/opt/homebrew", "/usr/local/Cellar"]
//!
//! [build]
//! arch = "arm64"
//!
//! [[external]]
//! path = "external/qml-box2d"
//! url = "https://github.com/qml-box2d/qml-box2d.git"
//! ```

use super::Arch;
use std::path::PathBuf;

/// Parsed `bundle.toml`.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct PipelineManifest {
    pub app: AppSection,
    pub toolkit: ToolkitSection,
    pub build: BuildSection,
    pub deploy: DeploySection,
    /// Source modules fetched from a remote repository when absent.
    #[serde(rename = "external")]
    pub external_modules: Vec<ExternalModule>,
}

impl Default for PipelineManifest {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            toolkit: ToolkitSection::default(),
            build: BuildSection::default(),
            deploy: DeploySection::default(),
            external_modules: vec![ExternalModule {
                path: PathBuf::from("external/qml-box2d"),
                url: "https://github.com/qml-box2d/qml-box2d.git".to_string(),
            }],
        }
    }
}

/// `[app]` section.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct AppSection {
    /// Bundle name without the `.app` suffix.
    pub name: String,

    /// CMake target producing the bundle. Defaults to `name`.
    pub target: Option<String>,

    /// Prefix of the `<PREFIX>_MAJOR_VERSION` / `<PREFIX>_MINOR_VERSION`
    /// variables in the build configuration.
    pub version_variable_prefix: String,

    /// Build configuration file holding the version variables, relative to
    /// the source root.
    pub version_file: PathBuf,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: "App".to_string(),
            target: None,
            version_variable_prefix: "APP".to_string(),
            version_file: PathBuf::from("CMakeLists.txt"),
        }
    }
}

/// `[toolkit]` section.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct ToolkitSection {
    /// Known-good package-manager install, accepted without opt-in.
    pub pinned_root: Option<PathBuf>,

    /// Package name queried from the package manager.
    pub package: String,

    /// Directory under `$HOME` holding installer kits (`<version>/macos`).
    pub home_directory: String,

    /// Path prefixes whose layout breaks dependency walking.
    pub distrusted_prefixes: Vec<String>,
}

impl Default for ToolkitSection {
    fn default() -> Self {
        Self {
            pinned_root: Some(PathBuf::from("/opt/homebrew/Cellar/qt/6.7.3")),
            package: "qt".to_string(),
            home_directory: "Qt".to_string(),
            distrusted_prefixes: vec![
                "/opt/homebrew".to_string(),
                "/usr/local/Cellar".to_string(),
                "/usr/local/opt".to_string(),
            ],
        }
    }
}

/// `[build]` section.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct BuildSection {
    pub arch: Arch,

    /// CMake executable (name on `PATH` or absolute path).
    pub cmake: String,

    /// CMake option toggling translations.
    pub translations_option: String,

    /// CMake option toggling the secondary server component.
    pub server_option: String,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            arch: Arch::default(),
            cmake: "cmake".to_string(),
            translations_option: "WITH_TRANSLATIONS".to_string(),
            server_option: "BUILD_SERVER".to_string(),
        }
    }
}

/// `[deploy]` section.
#[derive(Clone, Debug, serde::Deserialize)]
#[serde(default)]
pub struct DeploySection {
    /// QML sources scanned by the deployer for plugin imports, relative to
    /// the source root.
    pub qml_dir: PathBuf,

    /// Extra library search paths handed to the deployer.
    pub library_paths: Vec<PathBuf>,

    /// Package-manager library locations; glob patterns are expanded and
    /// only existing directories are passed on.
    pub package_manager_library_globs: Vec<String>,
}

impl Default for DeploySection {
    fn default() -> Self {
        Self {
            qml_dir: PathBuf::from("src"),
            library_paths: Vec::new(),
            package_manager_library_globs: vec![
                "/opt/homebrew/lib".to_string(),
                "/opt/homebrew/opt/*/lib".to_string(),
                "/usr/local/lib".to_string(),
                "/usr/local/opt/*/lib".to_string(),
            ],
        }
    }
}

/// A source module pulled from a remote repository when missing locally.
#[derive(Clone, Debug, serde::Deserialize)]
pub struct ExternalModule {
    /// Checkout location relative to the source root.
    pub path: PathBuf,
    /// Clone URL.
    pub url: String,
}
