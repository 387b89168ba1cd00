//! Post-build relocation pipeline for Qt application bundles on macOS.
//!
//! Takes a freshly built `.app` whose binaries still reference libraries by
//! absolute build-machine paths and turns it into a self-contained, ad-hoc
//! signed, verified disk image.
//!
//! It can be used both as a CLI tool and as a library dependency; see
//! [`bundler::Pipeline`] for the library entry point.

pub mod bundler;
pub mod cli;
pub mod error;
pub mod metadata;
pub mod source;

// Re-export commonly used types
pub use error::{BundlerError, CliError, Result};
