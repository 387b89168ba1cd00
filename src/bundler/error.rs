//! Error taxonomy for the relocation pipeline.
//!
//! Every fatal condition a stage can hit has its own variant so the CLI can
//! print one actionable line and pick a distinct exit code. Non-fatal
//! conditions (deployer exit status, smoke test) are not errors; they are
//! collected as [`PipelineWarning`](crate::bundler::PipelineWarning)s.

use crate::bundler::platform::macos::verify::Offense;
use crate::bundler::toolkit::LayoutClass;
use std::fmt::Display;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used across the bundler.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by pipeline stages.
#[derive(Debug, Error)]
pub enum Error {
    /// A required external program is not installed.
    #[error("required tool `{tool}` not found: {hint}")]
    MissingPrerequisite { tool: String, hint: String },

    /// No candidate source produced a usable toolkit root.
    #[error(
        "no usable Qt toolkit found (tried: {}). Install the online-installer kit under \
         ~/Qt/<version>/macos, or install the package-manager kit (`brew install qt`) and rerun \
         with --allow-distrusted-toolkit",
        attempted.join("; ")
    )]
    ToolkitUnresolved { attempted: Vec<String> },

    /// The resolved toolkit lives in a layout the deployer cannot walk reliably.
    #[error(
        "toolkit at {} has an unreliable layout ({class:?}); pass --allow-distrusted-toolkit \
         or set ALLOW_DISTRUSTED_TOOLKIT=1 to use it anyway",
        root.display()
    )]
    UntrustedLayout { root: PathBuf, class: LayoutClass },

    /// Configuration or compilation exited non-zero.
    #[error("build {step} step failed (exit code: {})", code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    BuildFailure { step: &'static str, code: Option<i32> },

    /// A step reported success but its output is missing.
    #[error("{what} not found at expected path {}", expected.display())]
    MissingArtifact { what: &'static str, expected: PathBuf },

    /// Absolute references into a distrusted layout survived the rewrite.
    #[error(
        "bundle is not portable: {} disallowed reference(s) survive, first: {}",
        offenses.len(),
        offenses.first().map_or_else(String::new, |o| o.to_string())
    )]
    PortabilityViolation { offenses: Vec<Offense> },

    /// Ad-hoc signing or signature validation failed.
    #[error("code signing failed for {}: {reason}", bundle.display())]
    SigningFailure { bundle: PathBuf, reason: String },

    /// Fetching an external source module failed.
    #[error("failed to fetch {url}: {reason} (check network connectivity and rerun)")]
    NetworkFetchFailure { url: String, reason: String },

    /// An external command exceeded its time budget.
    #[error("`{command}` timed out after {seconds}s")]
    Timeout { command: String, seconds: u64 },

    /// The run was cancelled between steps.
    #[error("pipeline cancelled")]
    Cancelled,

    #[error("{0}")]
    GenericError(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    /// IO error with the operation and path that caused it.
    #[error("{context} {}: {error}", path.display())]
    Fs {
        context: &'static str,
        path: PathBuf,
        error: std::io::Error,
    },

    #[error(transparent)]
    WalkDir(#[from] walkdir::Error),

    #[error(transparent)]
    StripPrefix(#[from] std::path::StripPrefixError),
}

/// Attach a context message to an error or a missing value.
pub trait Context<T> {
    /// Wrap the error (or `None`) in a [`Error::GenericError`] with `context`.
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static;

    /// Lazily computed variant of [`Context::context`].
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T> Context<T> for Result<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.map_err(|e| Error::GenericError(format!("{context}: {e}")))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| Error::GenericError(format!("{}: {e}", f())))
    }
}

impl<T> Context<T> for Option<T> {
    fn context<C>(self, context: C) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
    {
        self.ok_or_else(|| Error::GenericError(context.to_string()))
    }

    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.ok_or_else(|| Error::GenericError(f().to_string()))
    }
}

/// Attach filesystem context to IO results.
pub trait ErrorExt<T> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> ErrorExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, context: &'static str, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|error| Error::Fs {
            context,
            path: path.into(),
            error,
        })
    }
}

/// Return early with a [`Error::GenericError`].
#[macro_export]
macro_rules! bail {
    ($msg:literal $(,)?) => {
        return Err($crate::bundler::Error::GenericError(format!($msg)))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::bundler::Error::GenericError(format!($fmt, $($arg)*)))
    };
}
