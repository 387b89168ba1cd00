//! What a pipeline run did, and what it tolerated.

use crate::bundler::platform::macos::dylib::Rewrite;
use crate::bundler::platform::macos::verify::VerificationResult;
use crate::bundler::toolkit::ToolkitRoot;
use std::fmt;
use std::path::PathBuf;

/// A non-fatal condition recorded during the run.
///
/// Warnings are surfaced in the final summary and never change the exit code.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PipelineWarning {
    /// The deployer exited non-zero. Its exit code is advisory.
    Deployment { code: Option<i32> },
    /// The launch probe failed or could not run.
    SmokeTest { reason: String },
    /// Making a file writable before rewriting it failed.
    PermissionTolerated { path: PathBuf, reason: String },
    /// The rewrite tool rejected a change; the verifier decides if it matters.
    RewriteFailed {
        binary: PathBuf,
        reference: String,
        reason: String,
    },
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineWarning::Deployment { code } => write!(
                f,
                "deployer exited with {}; continuing, the verifier has the final say",
                code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
            ),
            PipelineWarning::SmokeTest { reason } => write!(f, "launch probe failed: {reason}"),
            PipelineWarning::PermissionTolerated { path, reason } => {
                write!(f, "could not make {} writable: {reason}", path.display())
            }
            PipelineWarning::RewriteFailed {
                binary,
                reference,
                reason,
            } => write!(
                f,
                "could not rewrite {reference} in {}: {reason}",
                binary.display()
            ),
        }
    }
}

/// Result of a successful run.
#[derive(Clone, Debug)]
pub struct PipelineReport {
    /// Toolkit used for build and deployment; `None` when only the
    /// post-build stages ran.
    pub toolkit: Option<ToolkitRoot>,
    /// The relocated bundle.
    pub bundle: PathBuf,
    /// References rewritten by the closure rewriter.
    pub rewrites: Vec<Rewrite>,
    /// Verifier outcome; always passed in a returned report.
    pub verification: VerificationResult,
    /// The distributable container.
    pub archive: PathBuf,
    /// SHA-256 of the container.
    pub checksum: String,
    pub warnings: Vec<PipelineWarning>,
}
