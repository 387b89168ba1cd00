//! Mach-O load command inspection using goblin.

use super::BinaryInspector;
use crate::bundler::{Result, error::ErrorExt};
use goblin::mach::{Mach, MachO, SingleArch};
use std::path::Path;

/// Reads `LC_LOAD_DYLIB`-family references directly from the file.
///
/// Fat binaries report the union of every slice's references.
#[derive(Debug, Default, Clone, Copy)]
pub struct GoblinInspector;

fn push_libs(macho: &MachO<'_>, out: &mut Vec<String>) {
    // goblin lists the binary's own install name as "self"
    for lib in macho.libs.iter().filter(|l| **l != "self") {
        if !out.iter().any(|existing| existing == lib) {
            out.push(lib.to_string());
        }
    }
}

impl BinaryInspector for GoblinInspector {
    fn linked_libraries(&self, binary: &Path) -> Result<Vec<String>> {
        let buffer = std::fs::read(binary).fs_context("failed to read binary", binary)?;

        let object = match goblin::Object::parse(&buffer) {
            Ok(object) => object,
            Err(e) => {
                log::debug!("{} is not a parsable binary: {}", binary.display(), e);
                return Ok(Vec::new());
            }
        };

        let mut libs = Vec::new();
        match object {
            goblin::Object::Mach(Mach::Binary(macho)) => push_libs(&macho, &mut libs),
            goblin::Object::Mach(Mach::Fat(fat)) => {
                for arch in &fat {
                    match arch {
                        Ok(SingleArch::MachO(macho)) => push_libs(&macho, &mut libs),
                        Ok(SingleArch::Archive(_)) => {}
                        Err(e) => log::warn!(
                            "Skipping unreadable slice of {}: {}",
                            binary.display(),
                            e
                        ),
                    }
                }
            }
            _ => log::debug!("{} is not a Mach-O file", binary.display()),
        }

        Ok(libs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_binary_files_have_no_references() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("launcher.sh");
        std::fs::write(&script, "#!/bin/sh\nexec \"$0.bin\" \"$@\"\n").unwrap();
        assert!(GoblinInspector.linked_libraries(&script).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            GoblinInspector
                .linked_libraries(&dir.path().join("absent"))
                .is_err()
        );
    }
}
