//! Top-level error type for the CLI.
//!
//! Wraps bundler errors together with argument and configuration problems and
//! maps every fatal kind to an exit code and actionable recovery hints.

use crate::bundler::Error as PipelineError;
use thiserror::Error;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, BundlerError>;

/// Main error type for all CLI operations
#[derive(Error, Debug)]
pub enum BundlerError {
    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Manifest parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Pipeline errors
    #[error("{0}")]
    Bundler(#[from] PipelineError),
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// Command execution failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the error
        reason: String,
    },
}

impl BundlerError {
    /// Process exit code for this error. Never 0.
    pub fn exit_code(&self) -> i32 {
        match self {
            BundlerError::Cli(_) | BundlerError::Toml(_) => 2,
            BundlerError::Io(_) => 1,
            BundlerError::Bundler(e) => match e {
                PipelineError::MissingPrerequisite { .. } => 3,
                PipelineError::ToolkitUnresolved { .. } => 4,
                PipelineError::UntrustedLayout { .. } => 5,
                PipelineError::BuildFailure { .. } => 6,
                PipelineError::MissingArtifact { .. } => 7,
                PipelineError::PortabilityViolation { .. } => 8,
                PipelineError::SigningFailure { .. } => 9,
                PipelineError::NetworkFetchFailure { .. } => 10,
                PipelineError::Timeout { .. } => 11,
                PipelineError::Cancelled => 130,
                _ => 1,
            },
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        let BundlerError::Bundler(e) = self else {
            return vec!["Run with --help to see the accepted flags".to_string()];
        };

        match e {
            PipelineError::MissingPrerequisite { tool, .. } => vec![format!(
                "Install `{tool}` (Xcode command line tools: xcode-select --install) and rerun"
            )],
            PipelineError::ToolkitUnresolved { .. } => vec![
                "Install Qt with the online installer into ~/Qt".to_string(),
                "Or `brew install qt` and rerun with --allow-distrusted-toolkit".to_string(),
                "Or point --qt-root / QT_ROOT at an existing toolkit".to_string(),
            ],
            PipelineError::UntrustedLayout { .. } => vec![
                "Prefer an installer kit under ~/Qt".to_string(),
                "Or rerun with --allow-distrusted-toolkit (ALLOW_DISTRUSTED_TOOLKIT=1)".to_string(),
            ],
            PipelineError::BuildFailure { .. } => {
                vec!["Fix the compiler or CMake errors printed above; build failures are not retried".to_string()]
            }
            PipelineError::MissingArtifact { expected, .. } => vec![format!(
                "The toolchain produced no output at {}; check the target name in bundle.toml",
                expected.display()
            )],
            PipelineError::PortabilityViolation { offenses } => offenses
                .iter()
                .map(|o| format!("Bundle {} or relink {}", o.basename(), o.binary.display()))
                .collect(),
            PipelineError::NetworkFetchFailure { .. } => {
                vec!["Check network connectivity and rerun".to_string()]
            }
            PipelineError::Cancelled => vec!["Rerun to start over".to_string()],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
