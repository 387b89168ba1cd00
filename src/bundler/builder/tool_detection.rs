//! Prerequisite checks run before anything touches the filesystem.

use crate::bundler::settings::Settings;
use crate::bundler::toolkit::ToolkitRoot;
use crate::bundler::tools::Toolset;
use crate::bundler::{Error, Result};
use crate::source;

fn hint_for(tool: &str) -> &'static str {
    match tool {
        "cmake" => "install CMake (`brew install cmake`) or add it to PATH",
        "git" => "install git (xcode-select --install) to fetch external modules",
        "install_name_tool" | "codesign" | "hdiutil" => {
            "install the Xcode command line tools: xcode-select --install"
        }
        _ => "install it or add it to PATH",
    }
}

fn require(tool: &str) -> Result<()> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at {}", tool, path.display());
            Ok(())
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            Err(Error::MissingPrerequisite {
                tool: tool.to_string(),
                hint: hint_for(tool).to_string(),
            })
        }
    }
}

/// Checks every external program the run will need.
///
/// `git` is only required when an external module is still missing.
pub fn check_prerequisites(settings: &Settings, toolset: &Toolset) -> Result<()> {
    require(&settings.manifest().build.cmake)?;

    for program in toolset.required_programs() {
        require(program)?;
    }

    let needs_git = settings
        .manifest()
        .external_modules
        .iter()
        .any(|m| source::needs_fetch(settings.source_dir(), m));
    if needs_git {
        require("git")?;
    }

    log::info!("✓ Prerequisites available");
    Ok(())
}

/// The toolkit must ship its bundle deployer.
pub fn check_deployer(toolkit: &ToolkitRoot) -> Result<()> {
    let deployer = toolkit.deployer();
    if deployer.is_file() {
        Ok(())
    } else {
        Err(Error::MissingPrerequisite {
            tool: deployer.display().to_string(),
            hint: format!(
                "the toolkit at {} has no macdeployqt; point --qt-root at a complete kit",
                toolkit.path().display()
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::toolkit::{LayoutClass, ToolkitOrigin};

    #[test]
    fn missing_program_reports_hint() {
        let err = require("definitely-not-installed-3b9f").unwrap_err();
        assert!(matches!(err, Error::MissingPrerequisite { ref tool, .. } if tool == "definitely-not-installed-3b9f"));
    }

    #[test]
    fn toolkit_without_deployer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let root = ToolkitRoot::new(
            dir.path().to_path_buf(),
            ToolkitOrigin::ExplicitOverride,
            LayoutClass::Preferred,
        );
        assert!(check_deployer(&root).is_err());

        std::fs::create_dir_all(dir.path().join("bin")).unwrap();
        std::fs::write(dir.path().join("bin/macdeployqt"), b"").unwrap();
        assert!(check_deployer(&root).is_ok());
    }
}
