//! Distributable container for the verified bundle.
//!
//! The container holds the `.app` and an `Applications` symlink for
//! drag-to-install. On macOS it is a compressed disk image; elsewhere the
//! same staging tree is packed into a tarball.

mod creation;

pub use creation::{APPLICATIONS_LINK, create_archive, stage_bundle};
