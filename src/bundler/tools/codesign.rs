//! Bundle signing and validation with `codesign`.

use super::{CodeSigner, process};
use crate::bundler::{Error, Result};
use std::path::Path;
use std::process::Command;

/// `codesign` wrapper.
///
/// The identity `-` is Apple's marker for an ad-hoc (self-issued) signature,
/// good enough for local and internal execution but not for notarized
/// distribution.
#[derive(Debug, Clone)]
pub struct Codesign {
    identity: String,
}

impl Codesign {
    pub fn ad_hoc() -> Self {
        Self {
            identity: "-".to_string(),
        }
    }

    fn check(output: process::CommandOutput, bundle: &Path) -> Result<()> {
        if output.success() {
            return Ok(());
        }
        Err(Error::SigningFailure {
            bundle: bundle.to_path_buf(),
            reason: output.stderr.trim().to_string(),
        })
    }
}

impl CodeSigner for Codesign {
    fn sign_ad_hoc(&self, bundle: &Path) -> Result<()> {
        log::info!("Signing {} (identity: {})", bundle.display(), self.identity);
        let mut command = Command::new("codesign");
        command
            .args(["--force", "--deep", "--sign", &self.identity])
            .arg(bundle);
        Self::check(process::run(command, process::TOOL_TIMEOUT)?, bundle)
    }

    fn validate(&self, bundle: &Path) -> Result<()> {
        let mut command = Command::new("codesign");
        command
            .args(["--verify", "--deep", "--strict", "--verbose=2"])
            .arg(bundle);
        Self::check(process::run(command, process::TOOL_TIMEOUT)?, bundle)
    }

    fn program(&self) -> Option<&str> {
        Some("codesign")
    }
}
