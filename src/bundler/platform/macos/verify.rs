//! Post-rewrite integrity checks.
//!
//! Signing and the portability rescan are authoritative: a surviving
//! reference into a distrusted prefix fails the run. The launch probe is
//! best-effort, since a headless machine may be unable to start a GUI
//! process, and only produces a warning.

use super::MACOS_DIR;
use super::dylib::scan_references;
use crate::bundler::builder::PipelineWarning;
use crate::bundler::toolkit::PrefixClassifier;
use crate::bundler::tools::{BinaryInspector, CodeSigner, process};
use crate::bundler::{Error, Result, Settings};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Budget for the launch probe.
pub const SMOKE_TEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A reference into a distrusted prefix that survived rewriting.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offense {
    pub binary: PathBuf,
    pub reference: String,
    /// A same-named library exists in `Contents/Frameworks`, so the rewrite
    /// should have caught it.
    pub bundled: bool,
}

impl Offense {
    /// File name of the offending reference.
    pub fn basename(&self) -> &str {
        Path::new(&self.reference)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&self.reference)
    }
}

impl fmt::Display for Offense {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.binary.display(), self.reference)?;
        if self.bundled {
            write!(f, " (bundled copy not linked)")?;
        }
        Ok(())
    }
}

/// Outcome of the portability rescan.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct VerificationResult {
    pub offenses: Vec<Offense>,
}

impl VerificationResult {
    pub fn passed(&self) -> bool {
        self.offenses.is_empty()
    }
}

/// Rescans every binary for references still carrying a distrusted prefix.
pub fn scan_for_leaks(
    bundle: &Path,
    classifier: &PrefixClassifier,
    inspector: &dyn BinaryInspector,
) -> Result<VerificationResult> {
    let frameworks = bundle.join(super::FRAMEWORKS_DIR);
    let offenses = scan_references(bundle, inspector)?
        .into_iter()
        .filter(|dep| classifier.is_distrusted(Path::new(&dep.reference)))
        .map(|dep| {
            let bundled = super::dylib::bundled_tail(&dep.reference)
                .is_some_and(|tail| frameworks.join(tail).is_file());
            Offense {
                binary: dep.binary,
                reference: dep.reference,
                bundled,
            }
        })
        .collect();

    Ok(VerificationResult { offenses })
}

/// The bundle's main executable, `Contents/MacOS/<app>`.
pub fn main_executable(settings: &Settings, bundle: &Path) -> PathBuf {
    bundle.join(MACOS_DIR).join(settings.app_name())
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Signs, validates and rescans a relocated bundle.
pub struct Verifier<'a> {
    settings: &'a Settings,
    classifier: &'a PrefixClassifier,
    inspector: &'a dyn BinaryInspector,
    signer: &'a dyn CodeSigner,
}

impl<'a> Verifier<'a> {
    pub fn new(
        settings: &'a Settings,
        classifier: &'a PrefixClassifier,
        inspector: &'a dyn BinaryInspector,
        signer: &'a dyn CodeSigner,
    ) -> Self {
        Self {
            settings,
            classifier,
            inspector,
            signer,
        }
    }

    /// Runs the checks in order: sign, validate, rescan, launch probe.
    ///
    /// With `skip_checks` set, validation and the probe are skipped; the
    /// rescan always runs.
    ///
    /// # Errors
    ///
    /// - [`Error::SigningFailure`] if signing or validation fails
    /// - [`Error::PortabilityViolation`] if any offense survives
    /// - [`Error::MissingArtifact`] if the main executable is missing or not
    ///   executable
    pub async fn verify(
        &self,
        bundle: &Path,
        cancel: &CancellationToken,
    ) -> Result<(VerificationResult, Vec<PipelineWarning>)> {
        let mut warnings = Vec::new();

        log::info!("Signing {} (ad-hoc)", bundle.display());
        self.signer.sign_ad_hoc(bundle)?;

        if self.settings.skip_checks() {
            log::info!("Skipping signature validation (--skip-checks)");
        } else {
            self.signer.validate(bundle)?;
            log::info!("✓ Signature valid");
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let result = scan_for_leaks(bundle, self.classifier, self.inspector)?;
        if !result.passed() {
            for offense in &result.offenses {
                log::error!("Disallowed reference: {}", offense);
            }
            return Err(Error::PortabilityViolation {
                offenses: result.offenses,
            });
        }
        log::info!("✓ No references into distrusted prefixes");

        if self.settings.skip_checks() {
            log::info!("Skipping launch probe (--skip-checks)");
        } else if let Some(warning) = self.smoke_test(bundle, cancel).await? {
            warnings.push(warning);
        }

        Ok((result, warnings))
    }

    /// Launches the main executable with `--version` on the offscreen
    /// platform plugin.
    ///
    /// A missing or non-executable binary is fatal; anything that goes wrong
    /// once it is launched is returned as a warning.
    pub async fn smoke_test(
        &self,
        bundle: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<PipelineWarning>> {
        let executable = main_executable(self.settings, bundle);
        if !is_executable_file(&executable) {
            return Err(Error::MissingArtifact {
                what: "main executable",
                expected: executable,
            });
        }

        let mut command = tokio::process::Command::new(&executable);
        command.arg("--version").env("QT_QPA_PLATFORM", "offscreen");

        let reason = match process::run_streaming(command, SMOKE_TEST_TIMEOUT, cancel).await {
            Ok(status) if status.success() => {
                log::info!("✓ Launch probe passed");
                return Ok(None);
            }
            Ok(status) => format!("exited with {status}"),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => e.to_string(),
        };

        let warning = PipelineWarning::SmokeTest { reason };
        log::warn!("{}", warning);
        Ok(Some(warning))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Listed(Vec<(&'static str, Vec<&'static str>)>);

    impl BinaryInspector for Listed {
        fn linked_libraries(&self, binary: &Path) -> Result<Vec<String>> {
            let name = binary.file_name().and_then(|n| n.to_str()).unwrap_or("");
            Ok(self
                .0
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(_, refs)| refs.iter().map(|r| r.to_string()).collect())
                .unwrap_or_default())
        }
    }

    fn bundle_with(dir: &Path) -> PathBuf {
        let bundle = dir.join("App.app");
        std::fs::create_dir_all(bundle.join("Contents/MacOS")).unwrap();
        std::fs::create_dir_all(bundle.join("Contents/Frameworks")).unwrap();
        std::fs::write(bundle.join("Contents/Frameworks/libfoo.dylib"), b"").unwrap();
        std::fs::write(bundle.join("Contents/Frameworks/libbar.dylib"), b"").unwrap();
        bundle
    }

    #[test]
    fn surviving_prefix_reference_is_an_offense() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle_with(dir.path());
        let inspector = Listed(vec![(
            "libbar.dylib",
            vec![
                "/usr/lib/libSystem.B.dylib",
                "/opt/homebrew/lib/libfoo.dylib",
                "/opt/homebrew/lib/libzstd.dylib",
            ],
        )]);
        let classifier = PrefixClassifier::new(&["/opt/homebrew".to_string()]);

        let result = scan_for_leaks(&bundle, &classifier, &inspector).unwrap();
        assert!(!result.passed());
        assert_eq!(result.offenses.len(), 2);
        assert!(result.offenses[0].bundled);
        assert!(!result.offenses[1].bundled);
        assert_eq!(result.offenses[1].basename(), "libzstd.dylib");
    }

    #[test]
    fn relative_references_pass() {
        let dir = tempfile::tempdir().unwrap();
        let bundle = bundle_with(dir.path());
        let inspector = Listed(vec![(
            "libbar.dylib",
            vec!["@executable_path/../Frameworks/libfoo.dylib", "/usr/lib/libc++.1.dylib"],
        )]);
        let classifier = PrefixClassifier::new(&["/opt/homebrew".to_string()]);

        assert!(scan_for_leaks(&bundle, &classifier, &inspector).unwrap().passed());
    }

    #[test]
    fn offense_display_names_both_ends() {
        let offense = Offense {
            binary: PathBuf::from("/b/App.app/Contents/MacOS/App"),
            reference: "/opt/homebrew/lib/libfoo.dylib".to_string(),
            bundled: false,
        };
        assert_eq!(
            offense.to_string(),
            "/b/App.app/Contents/MacOS/App -> /opt/homebrew/lib/libfoo.dylib"
        );
    }
}
