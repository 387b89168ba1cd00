//! Dependency closure repair for deployed `.app` bundles.
//!
//! The deployer leaves some binaries pointing at absolute paths inside the
//! toolkit or package-manager prefix even though a same-named copy was
//! bundled. This module finds those references and points them at the
//! bundled copy through `@executable_path/../Frameworks`.
//!
//! The rewrite only touches references under a distrusted prefix whose
//! target exists in `Contents/Frameworks`. After rewriting, such a reference
//! no longer carries the prefix, so a second pass changes nothing.

use super::FRAMEWORKS_DIR;
use crate::bundler::builder::PipelineWarning;
use crate::bundler::toolkit::PrefixClassifier;
use crate::bundler::tools::{BinaryInspector, ReferenceRewriter};
use crate::bundler::{Error, Result};
use std::path::{Component, Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Load-time location of the bundle's Frameworks directory, relative to the
/// running executable in `Contents/MacOS`.
pub const FRAMEWORKS_LOADER_PATH: &str = "@executable_path/../Frameworks";

/// One linked-library edge found in a binary. Recomputed on every scan.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DependencyReference {
    /// Binary carrying the load command.
    pub binary: PathBuf,
    /// Referenced path as written in the binary.
    pub reference: String,
    /// File name of the referenced library.
    pub basename: String,
}

/// A reference rewritten in place.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Rewrite {
    pub binary: PathBuf,
    pub from: String,
    pub to: String,
}

/// Outcome of one rewrite pass.
#[derive(Clone, Debug, Default)]
pub struct RewriteReport {
    pub binaries_scanned: usize,
    pub rewrites: Vec<Rewrite>,
    /// Distrusted references with no bundled counterpart, left for the OS
    /// loader (and the verifier).
    pub unbundled: Vec<DependencyReference>,
    pub warnings: Vec<PipelineWarning>,
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(&e))
}

#[cfg(unix)]
fn is_executable(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &std::fs::Metadata) -> bool {
    false
}

/// Every binary in the bundle: regular files with an execute bit or a shared
/// library extension. Symlinks are skipped so framework aliases are visited
/// once. Sorted for a deterministic order.
pub fn enumerate_binaries(bundle: &Path) -> Result<Vec<PathBuf>> {
    let mut binaries = Vec::new();

    for entry in walkdir::WalkDir::new(bundle).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let metadata = entry.metadata()?;
        if has_extension(entry.path(), &["dylib", "so"]) || is_executable(&metadata) {
            binaries.push(entry.into_path());
        }
    }

    binaries.sort();
    Ok(binaries)
}

/// Linked-library references of every binary in the bundle.
pub fn scan_references(
    bundle: &Path,
    inspector: &dyn BinaryInspector,
) -> Result<Vec<DependencyReference>> {
    let mut references = Vec::new();
    for binary in enumerate_binaries(bundle)? {
        references.extend(references_of(&binary, inspector)?);
    }
    Ok(references)
}

fn references_of(binary: &Path, inspector: &dyn BinaryInspector) -> Result<Vec<DependencyReference>> {
    Ok(inspector
        .linked_libraries(binary)?
        .into_iter()
        .filter_map(|reference| {
            let basename = Path::new(&reference).file_name()?.to_str()?.to_string();
            Some(DependencyReference {
                binary: binary.to_path_buf(),
                reference,
                basename,
            })
        })
        .collect())
}

/// Path of a referenced library relative to `Contents/Frameworks`.
///
/// Plain libraries map to their basename. Framework binaries keep their
/// in-framework path, so
/// `/opt/homebrew/lib/QtCore.framework/Versions/A/QtCore` maps to
/// `QtCore.framework/Versions/A/QtCore`.
pub fn bundled_tail(reference: &str) -> Option<PathBuf> {
    let path = Path::new(reference);
    let components: Vec<Component<'_>> = path.components().collect();

    let framework_start = components.iter().rposition(|c| {
        c.as_os_str()
            .to_str()
            .is_some_and(|name| name.ends_with(".framework"))
    });

    match framework_start {
        Some(start) if start + 1 < components.len() => {
            Some(components[start..].iter().collect())
        }
        _ => path.file_name().map(PathBuf::from),
    }
}

/// Load-time locator for a bundled library.
pub fn loader_path(tail: &Path) -> String {
    format!("{}/{}", FRAMEWORKS_LOADER_PATH, tail.display())
}

/// Permission step run on a binary before its load commands are edited.
type MakeWritable = fn(&Path) -> std::io::Result<Option<std::fs::Permissions>>;

/// Makes `path` owner-writable, returning the permissions to restore.
///
/// `Ok(None)` means it already was writable.
fn ensure_writable(path: &Path) -> std::io::Result<Option<std::fs::Permissions>> {
    let original = std::fs::metadata(path)?.permissions();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if original.mode() & 0o200 != 0 {
            return Ok(None);
        }
        let mut writable = original.clone();
        writable.set_mode(original.mode() | 0o200);
        std::fs::set_permissions(path, writable)?;
    }

    #[cfg(not(unix))]
    {
        if !original.readonly() {
            return Ok(None);
        }
        let mut writable = original.clone();
        #[allow(clippy::permissions_set_readonly_false)]
        writable.set_readonly(false);
        std::fs::set_permissions(path, writable)?;
    }

    Ok(Some(original))
}

/// Rewrites absolute references to libraries that are already bundled.
pub struct ClosureRewriter<'a> {
    bundle: &'a Path,
    classifier: &'a PrefixClassifier,
    inspector: &'a dyn BinaryInspector,
    rewriter: &'a dyn ReferenceRewriter,
    make_writable: MakeWritable,
}

impl<'a> ClosureRewriter<'a> {
    pub fn new(
        bundle: &'a Path,
        classifier: &'a PrefixClassifier,
        inspector: &'a dyn BinaryInspector,
        rewriter: &'a dyn ReferenceRewriter,
    ) -> Self {
        Self {
            bundle,
            classifier,
            inspector,
            rewriter,
            make_writable: ensure_writable,
        }
    }

    #[cfg(test)]
    fn with_make_writable(mut self, make_writable: MakeWritable) -> Self {
        self.make_writable = make_writable;
        self
    }

    fn frameworks_dir(&self) -> PathBuf {
        self.bundle.join(FRAMEWORKS_DIR)
    }

    /// Makes `path` writable; failure is recorded, never fatal.
    fn prepare(&self, path: &Path, report: &mut RewriteReport) -> Option<std::fs::Permissions> {
        match (self.make_writable)(path) {
            Ok(original) => original,
            Err(e) => {
                log::debug!("Could not make {} writable: {}", path.display(), e);
                report.warnings.push(PipelineWarning::PermissionTolerated {
                    path: path.to_path_buf(),
                    reason: e.to_string(),
                });
                None
            }
        }
    }

    fn restore(path: &Path, original: Option<std::fs::Permissions>) {
        if let Some(permissions) = original
            && let Err(e) = std::fs::set_permissions(path, permissions)
        {
            log::debug!("Could not restore permissions on {}: {}", path.display(), e);
        }
    }

    /// Runs one pass over every binary in the bundle.
    ///
    /// Cancellation is checked before each binary; a cancelled pass leaves
    /// already-rewritten binaries in place, which a later pass accepts.
    pub fn rewrite(&self, cancel: &CancellationToken) -> Result<RewriteReport> {
        let frameworks = self.frameworks_dir();
        let mut report = RewriteReport::default();

        for binary in enumerate_binaries(self.bundle)? {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            report.binaries_scanned += 1;

            let mut changed: Vec<String> = Vec::new();
            for dep in references_of(&binary, self.inspector)? {
                if !self.classifier.is_distrusted(Path::new(&dep.reference))
                    || changed.contains(&dep.reference)
                {
                    continue;
                }

                let Some(tail) = bundled_tail(&dep.reference) else {
                    continue;
                };
                let target = frameworks.join(&tail);
                if !target.is_file() {
                    log::debug!(
                        "{} references {} which is not bundled; leaving it to the loader",
                        binary.display(),
                        dep.reference
                    );
                    report.unbundled.push(dep);
                    continue;
                }

                let new_reference = loader_path(&tail);
                let binary_perms = self.prepare(&binary, &mut report);
                let target_perms = if target != binary {
                    self.prepare(&target, &mut report)
                } else {
                    None
                };

                log::debug!(
                    "Rewriting {}: {} -> {}",
                    binary.display(),
                    dep.reference,
                    new_reference
                );
                let outcome =
                    self.rewriter
                        .change_reference(&binary, &dep.reference, &new_reference);

                Self::restore(&binary, binary_perms);
                Self::restore(&target, target_perms);

                match outcome {
                    Ok(()) => {
                        changed.push(dep.reference.clone());
                        report.rewrites.push(Rewrite {
                            binary: binary.clone(),
                            from: dep.reference,
                            to: new_reference,
                        });
                    }
                    Err(e) => {
                        log::warn!(
                            "Failed to rewrite {} in {}: {}",
                            dep.reference,
                            binary.display(),
                            e
                        );
                        report.warnings.push(PipelineWarning::RewriteFailed {
                            binary: binary.clone(),
                            reference: dep.reference,
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        log::info!(
            "Rewrote {} reference(s) across {} binaries",
            report.rewrites.len(),
            report.binaries_scanned
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tail_of_plain_library_is_basename() {
        assert_eq!(
            bundled_tail("/opt/homebrew/opt/icu4c/lib/libicuuc.74.dylib"),
            Some(PathBuf::from("libicuuc.74.dylib"))
        );
    }

    #[test]
    fn tail_of_framework_keeps_inner_path() {
        assert_eq!(
            bundled_tail("/opt/homebrew/lib/QtCore.framework/Versions/A/QtCore"),
            Some(PathBuf::from("QtCore.framework/Versions/A/QtCore"))
        );
    }

    #[test]
    fn bare_framework_directory_falls_back_to_basename() {
        assert_eq!(
            bundled_tail("/opt/homebrew/lib/QtCore.framework"),
            Some(PathBuf::from("QtCore.framework"))
        );
    }

    #[test]
    fn loader_path_is_executable_relative() {
        assert_eq!(
            loader_path(Path::new("libfoo.dylib")),
            "@executable_path/../Frameworks/libfoo.dylib"
        );
    }

    #[cfg(unix)]
    #[test]
    fn enumerates_by_mode_and_extension() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("App.app");
        let macos = bundle.join("Contents/MacOS");
        let frameworks = bundle.join("Contents/Frameworks");
        let resources = bundle.join("Contents/Resources");
        for d in [&macos, &frameworks, &resources] {
            std::fs::create_dir_all(d).unwrap();
        }

        std::fs::write(macos.join("App"), b"exe").unwrap();
        std::fs::set_permissions(macos.join("App"), std::fs::Permissions::from_mode(0o755))
            .unwrap();
        std::fs::write(frameworks.join("libfoo.dylib"), b"lib").unwrap();
        std::fs::set_permissions(
            frameworks.join("libfoo.dylib"),
            std::fs::Permissions::from_mode(0o444),
        )
        .unwrap();
        std::fs::write(resources.join("qt.conf"), b"[Paths]").unwrap();
        std::os::unix::fs::symlink("libfoo.dylib", frameworks.join("libfoo.1.dylib")).unwrap();

        let binaries = enumerate_binaries(&bundle).unwrap();
        assert_eq!(
            binaries,
            vec![frameworks.join("libfoo.dylib"), macos.join("App")]
        );
    }

    struct Listed(Vec<(&'static str, Vec<&'static str>)>);

    impl BinaryInspector for Listed {
        fn linked_libraries(&self, binary: &Path) -> Result<Vec<String>> {
            let name = binary.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            Ok(self
                .0
                .iter()
                .find(|(b, _)| *b == name)
                .map(|(_, refs)| refs.iter().map(|r| r.to_string()).collect())
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct Recorded(std::sync::Mutex<Vec<(PathBuf, String, String)>>);

    impl ReferenceRewriter for Recorded {
        fn change_reference(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
            self.0
                .lock()
                .unwrap()
                .push((binary.to_path_buf(), old.to_string(), new.to_string()));
            Ok(())
        }
    }

    fn denied(_path: &Path) -> std::io::Result<Option<std::fs::Permissions>> {
        Err(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "operation not permitted",
        ))
    }

    #[test]
    fn permission_failure_does_not_stop_the_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = dir.path().join("App.app");
        let frameworks = bundle.join(FRAMEWORKS_DIR);
        std::fs::create_dir_all(&frameworks).unwrap();
        std::fs::write(frameworks.join("libbar.dylib"), b"bar").unwrap();
        std::fs::write(frameworks.join("libfoo.dylib"), b"foo").unwrap();

        let classifier = PrefixClassifier::new(&["/opt/homebrew".to_string()]);
        let inspector = Listed(vec![("libbar.dylib", vec!["/opt/homebrew/lib/libfoo.dylib"])]);
        let rewriter = Recorded::default();

        let report = ClosureRewriter::new(&bundle, &classifier, &inspector, &rewriter)
            .with_make_writable(denied)
            .rewrite(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.rewrites.len(), 1);
        assert_eq!(report.rewrites[0].to, "@executable_path/../Frameworks/libfoo.dylib");
        assert_eq!(rewriter.0.lock().unwrap().len(), 1);

        let tolerated: Vec<PathBuf> = report
            .warnings
            .iter()
            .filter_map(|w| match w {
                PipelineWarning::PermissionTolerated { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(
            tolerated,
            vec![frameworks.join("libbar.dylib"), frameworks.join("libfoo.dylib")]
        );
        assert_eq!(report.warnings.len(), 2);
    }
}
