//! Configuration for a pipeline run.
//!
//! [`PipelineManifest`] mirrors the optional `bundle.toml`; [`SettingsBuilder`]
//! merges it with CLI flags into the immutable [`Settings`] every stage reads.

mod arch;
mod builder;
mod core;
mod manifest;

pub use arch::Arch;
pub use builder::SettingsBuilder;
pub use core::{Settings, VersionPair};
pub use manifest::{
    AppSection, BuildSection, DeploySection, ExternalModule, PipelineManifest, ToolkitSection,
};
