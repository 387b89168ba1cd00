//! Platform-specific pipeline stages.
//!
//! Bundle relocation is a macOS concern: the stages rely on Mach-O load
//! commands, `@executable_path` and `.app` bundle layout.

pub mod macos;
