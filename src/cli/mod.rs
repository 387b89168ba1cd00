//! Command line interface.
//!
//! Parses flags, builds the immutable [`Settings`](crate::bundler::Settings),
//! runs the pipeline and prints a summary.

mod args;
mod output;

pub use args::Args;
pub use output::OutputManager;

use crate::bundler::{Pipeline, PipelineReport, SettingsBuilder, Toolset};
use crate::error::{BundlerError, Result};
use crate::metadata;

/// Main CLI entry point. Returns the process exit code.
pub async fn run() -> i32 {
    let args = Args::parse_args();
    let output = OutputManager::new(args.verbose, args.quiet);
    match run_with(args, &output).await {
        Ok(code) => code,
        Err(e) => {
            report_error(&e, &output);
            e.exit_code()
        }
    }
}

fn report_error(error: &BundlerError, output: &OutputManager) {
    let _ = output.error(&format!("Error: {error}"));
    for suggestion in error.recovery_suggestions() {
        eprintln!("  hint: {suggestion}");
    }
}

/// Runs the pipeline for already parsed arguments.
pub async fn run_with(args: Args, output: &OutputManager) -> Result<i32> {
    let (manifest_path, explicit) = args.manifest_path();
    let manifest = metadata::load_manifest(&manifest_path, explicit)?;

    let version_file = args.source.join(&manifest.app.version_file);
    let version = metadata::load_version(&version_file, &manifest.app.version_variable_prefix)?;

    let mut builder = SettingsBuilder::new()
        .manifest(manifest)
        .version(version)
        .source_dir(&args.source)
        .toolkit_override(args.qt_root)
        .translations(args.translations)
        .server(args.server)
        .skip_checks(args.skip_checks)
        .allow_distrusted_toolkit(args.allow_distrusted_toolkit)
        .arch(args.arch);
    if let Some(dir) = &args.build_dir {
        builder = builder.build_dir(dir);
    }
    if let Some(dir) = &args.dist_dir {
        builder = builder.dist_dir(dir);
    }
    let settings = builder.build()?;

    output.section(&format!("{} {}", settings.app_name(), settings.version()))?;
    output.progress(&format!("Source: {}", settings.source_dir().display()))?;

    let pipeline = Pipeline::new(settings, Toolset::native());
    let cancel = pipeline.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted; finishing the current step before stopping");
            cancel.cancel();
        }
    });

    let report = pipeline.run().await?;
    print_summary(&report, output)?;
    Ok(0)
}

fn print_summary(report: &PipelineReport, output: &OutputManager) -> Result<()> {
    output.section("Summary")?;
    if let Some(toolkit) = &report.toolkit {
        output.indent(&format!(
            "Toolkit:  {} ({})",
            toolkit.path().display(),
            toolkit.origin()
        ))?;
    }
    output.indent(&format!("Bundle:   {}", report.bundle.display()))?;
    output.indent(&format!("Rewrites: {}", report.rewrites.len()))?;
    for rewrite in &report.rewrites {
        output.verbose(&format!(
            "{}: {} -> {}",
            rewrite.binary.display(),
            rewrite.from,
            rewrite.to
        ))?;
    }
    output.indent(&format!("SHA-256:  {}", report.checksum))?;

    for warning in &report.warnings {
        output.warn(&warning.to_string())?;
    }

    output.success(&format!("Created {}", report.archive.display()))?;
    Ok(())
}
