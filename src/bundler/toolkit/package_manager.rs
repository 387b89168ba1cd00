//! Package manager queries for an installed toolkit.

use crate::bundler::tools::process;
use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// Asks a package manager where a package is installed.
pub trait PackageManager: Send + Sync {
    /// Human-readable name used in diagnostics.
    fn name(&self) -> &str;

    /// Install prefix of `package`, or `None` if it is not installed or the
    /// package manager itself is unavailable.
    fn query_prefix(&self, package: &str) -> Option<PathBuf>;
}

/// Homebrew (`brew --prefix <formula>`).
#[derive(Debug, Default, Clone, Copy)]
pub struct Homebrew;

impl PackageManager for Homebrew {
    fn name(&self) -> &str {
        "brew"
    }

    fn query_prefix(&self, package: &str) -> Option<PathBuf> {
        let brew = match which::which("brew") {
            Ok(path) => path,
            Err(e) => {
                log::debug!("brew not found in PATH: {}", e);
                return None;
            }
        };

        let mut command = Command::new(brew);
        command.args(["--prefix", package]);
        match process::run(command, QUERY_TIMEOUT) {
            Ok(output) if output.success() => {
                let prefix = output.stdout.trim();
                (!prefix.is_empty()).then(|| PathBuf::from(prefix))
            }
            Ok(output) => {
                log::debug!(
                    "brew --prefix {} failed: {}",
                    package,
                    output.stderr.trim()
                );
                None
            }
            Err(e) => {
                log::warn!("brew --prefix {} did not complete: {}", package, e);
                None
            }
        }
    }
}
