//! Load path rewriting with `install_name_tool`.

use super::{ReferenceRewriter, process};
use crate::bundler::{Error, Result};
use std::path::Path;
use std::process::Command;

/// Rewrites references with `install_name_tool -change`.
#[derive(Debug, Default, Clone, Copy)]
pub struct InstallNameTool;

impl ReferenceRewriter for InstallNameTool {
    fn change_reference(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        let mut command = Command::new("install_name_tool");
        command.arg("-change").arg(old).arg(new).arg(binary);

        let output = process::run(command, process::TOOL_TIMEOUT)?;
        if !output.success() {
            return Err(Error::GenericError(format!(
                "install_name_tool failed for {}: {} -> {}: {}",
                binary.display(),
                old,
                new,
                output.stderr.trim()
            )));
        }

        Ok(())
    }

    fn program(&self) -> Option<&str> {
        Some("install_name_tool")
    }
}
