//! Relocation pipeline for Qt application bundles.
//!
//! Turns a freshly built, absolute-path-linked `.app` into a portable, signed
//! disk image:
//!
//! 1. [`toolkit`] resolves a usable Qt toolkit root and gates distrusted layouts
//! 2. [`platform::macos::cmake`] configures and builds the bundle target
//! 3. [`platform::macos::deploy`] runs the bundle deployer (advisory exit status)
//! 4. [`platform::macos::dylib`] rewrites residual absolute library references
//! 5. [`platform::macos::verify`] signs the bundle and proves no leaks remain
//! 6. [`platform::macos::dmg`] stages and packages the verified bundle
//!
//! [`builder::Pipeline`] runs the stages in order against one immutable
//! [`Settings`].

pub mod builder;
pub mod error;
pub mod platform;
pub mod settings;
pub mod toolkit;
pub mod tools;
pub mod utils;

pub use builder::{Pipeline, PipelineReport, PipelineWarning};
pub use error::{Context, Error, ErrorExt, Result};
pub use settings::{Arch, PipelineManifest, Settings, SettingsBuilder};
pub use toolkit::{LayoutClass, ToolkitOrigin, ToolkitRoot};
pub use tools::Toolset;
