//! External tool capabilities.
//!
//! Each external program the pipeline depends on is reached through a narrow
//! trait, so a stage never knows whether it is talking to a subprocess or to
//! a native library:
//!
//! - [`BinaryInspector`] - list a binary's linked-library references
//! - [`ReferenceRewriter`] - replace one linked-library reference
//! - [`CodeSigner`] - ad-hoc sign a bundle and validate the signature
//! - [`ImageArchiver`] - package a directory as a single-file container
//!
//! [`Toolset::native`] wires up the macOS implementations.

mod archive;
mod codesign;
mod install_name;
mod macho;
pub mod process;

pub use archive::{Hdiutil, Tarball};
pub use codesign::Codesign;
pub use install_name::InstallNameTool;
pub use macho::GoblinInspector;

use crate::bundler::Result;
use crate::bundler::toolkit::{Homebrew, PackageManager};
use std::path::Path;

/// Reads load-time library references out of a binary.
pub trait BinaryInspector: Send + Sync {
    /// Returns the binary's linked-library references in load-command order.
    ///
    /// Files that are not binaries yield an empty list.
    fn linked_libraries(&self, binary: &Path) -> Result<Vec<String>>;

    /// External program this implementation shells out to, if any.
    fn program(&self) -> Option<&str> {
        None
    }
}

/// Rewrites a linked-library reference inside a binary.
pub trait ReferenceRewriter: Send + Sync {
    fn change_reference(&self, binary: &Path, old: &str, new: &str) -> Result<()>;

    fn program(&self) -> Option<&str> {
        None
    }
}

/// Seals a bundle with a signature and checks it.
pub trait CodeSigner: Send + Sync {
    /// Applies a self-issued signature covering the whole bundle tree.
    fn sign_ad_hoc(&self, bundle: &Path) -> Result<()>;

    /// Structurally re-validates the bundle's signature.
    fn validate(&self, bundle: &Path) -> Result<()>;

    fn program(&self) -> Option<&str> {
        None
    }
}

/// Packages a staging directory into one distributable file.
pub trait ImageArchiver: Send + Sync {
    /// File extension of the produced container, without the dot.
    fn extension(&self) -> &str;

    /// Packages `source` into `destination`, overwriting it.
    fn create(&self, volume_name: &str, source: &Path, destination: &Path) -> Result<()>;

    fn program(&self) -> Option<&str> {
        None
    }
}

/// The set of capabilities a pipeline run uses.
pub struct Toolset {
    pub inspector: Box<dyn BinaryInspector>,
    pub rewriter: Box<dyn ReferenceRewriter>,
    pub signer: Box<dyn CodeSigner>,
    pub archiver: Box<dyn ImageArchiver>,
    pub package_manager: Box<dyn PackageManager>,
}

impl std::fmt::Debug for Toolset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolset")
            .field("programs", &self.required_programs())
            .field("archive_extension", &self.archiver.extension())
            .finish()
    }
}

impl Toolset {
    /// Mach-O parsing in-process, Apple command line tools for the rest.
    ///
    /// Off macOS the container falls back to a gzip tarball.
    pub fn native() -> Self {
        let archiver: Box<dyn ImageArchiver> = if cfg!(target_os = "macos") {
            Box::new(Hdiutil)
        } else {
            Box::new(Tarball)
        };

        Self {
            inspector: Box::new(GoblinInspector),
            rewriter: Box::new(InstallNameTool),
            signer: Box::new(Codesign::ad_hoc()),
            archiver,
            package_manager: Box::new(Homebrew),
        }
    }

    /// External programs that must be on `PATH` before the run starts.
    ///
    /// The package manager is optional and therefore not listed.
    pub fn required_programs(&self) -> Vec<&str> {
        [
            self.inspector.program(),
            self.rewriter.program(),
            self.signer.program(),
            self.archiver.program(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}
