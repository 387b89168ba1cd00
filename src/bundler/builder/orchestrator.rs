//! Pipeline orchestration.
//!
//! Stages run strictly in sequence against one bundle directory; each stage
//! finishes all its filesystem changes before the next starts. The
//! cancellation token is checked between stages and, inside the rewriter,
//! between binaries.

use super::checksum::calculate_sha256;
use super::report::{PipelineReport, PipelineWarning};
use super::tool_detection::{check_deployer, check_prerequisites};
use crate::bundler::platform::macos::{cmake, deploy, dmg, dylib::ClosureRewriter, verify::Verifier};
use crate::bundler::toolkit::{PrefixClassifier, ToolkitLocator, ToolkitRoot, gate};
use crate::bundler::{Error, Result, Settings, Toolset};
use crate::source;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

/// Runs the relocation pipeline.
///
/// # Examples
///
/// ```no_run
/// use bundle_relocate::bundler::{Pipeline, Settings, Toolset};
///
/// # async fn example(settings: Settings) -> bundle_relocate::bundler::Result<()> {
/// let report = Pipeline::new(settings, Toolset::native()).run().await?;
/// println!("{} ({})", report.archive.display(), report.checksum);
/// # Ok(())
/// # }
/// ```
pub struct Pipeline {
    settings: Settings,
    toolset: Toolset,
    classifier: PrefixClassifier,
    cancel: CancellationToken,
    /// `None` uses the real home directory for the installer-kit scan.
    home: Option<Option<PathBuf>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("settings", &self.settings)
            .field("toolset", &self.toolset)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

impl Pipeline {
    pub fn new(settings: Settings, toolset: Toolset) -> Self {
        let classifier = PrefixClassifier::new(settings.distrusted_prefixes());
        Self {
            settings,
            toolset,
            classifier,
            cancel: CancellationToken::new(),
            home: None,
        }
    }

    /// Token that aborts the run at the next checkpoint when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Overrides the home directory scanned for installer kits.
    pub fn with_home(mut self, home: Option<PathBuf>) -> Self {
        self.home = Some(home);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn checkpoint(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            log::warn!("Cancellation requested; stopping");
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Resolves the toolkit and applies the trust gate.
    pub fn resolve_toolkit(&self) -> Result<ToolkitRoot> {
        let mut locator = ToolkitLocator::new(
            &self.settings,
            self.toolset.package_manager.as_ref(),
            &self.classifier,
        );
        if let Some(home) = &self.home {
            locator = locator.with_home(home.clone());
        }

        let toolkit = locator.locate()?;
        gate(&toolkit, self.settings.allow_distrusted_toolkit())?;
        Ok(toolkit)
    }

    /// Runs every stage from prerequisite checks to the final archive.
    pub async fn run(&self) -> Result<PipelineReport> {
        check_prerequisites(&self.settings, &self.toolset)?;

        let toolkit = self.resolve_toolkit()?;
        check_deployer(&toolkit)?;
        self.checkpoint()?;

        let fetched = source::fetch_missing(
            self.settings.source_dir(),
            &self.settings.manifest().external_modules,
            &self.cancel,
        )
        .await?;
        if fetched > 0 {
            log::info!("Fetched {} external module(s)", fetched);
        }
        self.checkpoint()?;

        let bundle = cmake::build_bundle(&self.settings, &toolkit, &self.cancel).await?;
        self.checkpoint()?;

        let mut warnings = Vec::new();
        if let Some(warning) =
            deploy::deploy_bundle(&self.settings, &toolkit, &bundle, &self.cancel).await?
        {
            warnings.push(warning);
        }
        self.checkpoint()?;

        let mut report = self.finalize(&bundle).await?;
        report.toolkit = Some(toolkit);
        warnings.append(&mut report.warnings);
        report.warnings = warnings;
        Ok(report)
    }

    /// Rewrites, verifies and packages an already deployed bundle.
    pub async fn finalize(&self, bundle: &Path) -> Result<PipelineReport> {
        if !bundle.is_dir() {
            return Err(Error::MissingArtifact {
                what: "application bundle",
                expected: bundle.to_path_buf(),
            });
        }

        let rewriter = ClosureRewriter::new(
            bundle,
            &self.classifier,
            self.toolset.inspector.as_ref(),
            self.toolset.rewriter.as_ref(),
        );
        let rewrite = rewriter.rewrite(&self.cancel)?;
        let mut warnings: Vec<PipelineWarning> = rewrite.warnings;
        self.checkpoint()?;

        let verifier = Verifier::new(
            &self.settings,
            &self.classifier,
            self.toolset.inspector.as_ref(),
            self.toolset.signer.as_ref(),
        );
        let (verification, mut verify_warnings) = verifier.verify(bundle, &self.cancel).await?;
        warnings.append(&mut verify_warnings);
        self.checkpoint()?;

        let archive =
            dmg::create_archive(&self.settings, self.toolset.archiver.as_ref(), bundle).await?;
        let checksum = calculate_sha256(&archive).await?;
        log::info!("SHA-256 {}", checksum);

        Ok(PipelineReport {
            toolkit: None,
            bundle: bundle.to_path_buf(),
            rewrites: rewrite.rewrites,
            verification,
            archive,
            checksum,
            warnings,
        })
    }
}
