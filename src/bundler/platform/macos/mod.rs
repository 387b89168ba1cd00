//! macOS stages of the relocation pipeline.
//!
//! - [`cmake`] - configure and build the `.app` target
//! - [`deploy`] - run `macdeployqt` with every known library path
//! - [`dylib`] - rewrite residual absolute references to bundled libraries
//! - [`verify`] - ad-hoc sign, validate and rescan for path leaks
//! - [`dmg`] - stage and package the verified bundle

pub mod cmake;
pub mod deploy;
pub mod dmg;
pub mod dylib;
pub mod verify;

/// Bundle-relative directory holding shared libraries and frameworks.
pub const FRAMEWORKS_DIR: &str = "Contents/Frameworks";

/// Bundle-relative directory holding the main executable.
pub const MACOS_DIR: &str = "Contents/MacOS";
