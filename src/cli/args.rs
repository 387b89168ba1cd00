//! Command line arguments.
//!
//! Every pipeline toggle also reads an environment variable so CI jobs can
//! configure a run without changing the invocation.

use crate::bundler::Arch;
use crate::metadata::DEFAULT_MANIFEST;
use clap::Parser;
use std::path::PathBuf;

/// Relocate, verify and package a Qt application bundle for macOS
#[derive(Parser, Debug)]
#[command(
    name = "bundle_relocate",
    version,
    about = "Relocate, verify and package a Qt application bundle for macOS",
    long_about = "Builds the application bundle with CMake, deploys the Qt frameworks into it, \
rewrites leftover absolute library references to bundle-relative ones, ad-hoc signs and verifies \
the result, and packages it as <app>-<major>.<minor>-macOS-internal.dmg.

Usage:
  bundle_relocate --source .
  QT_ROOT=~/Qt/6.7.3/macos WITH_TRANSLATIONS=1 bundle_relocate
  bundle_relocate --allow-distrusted-toolkit --skip-checks

Exit code 0 = the archive exists and its bundle passed the portability scan."
)]
pub struct Args {
    /// Source root containing CMakeLists.txt
    #[arg(short = 's', long, value_name = "DIR", default_value = ".")]
    pub source: PathBuf,

    /// Qt toolkit root; overrides every other discovery method
    #[arg(long, value_name = "DIR", env = "QT_ROOT")]
    pub qt_root: Option<PathBuf>,

    /// Build with translations
    #[arg(long, env = "WITH_TRANSLATIONS", value_parser = clap::builder::FalseyValueParser::new())]
    pub translations: bool,

    /// Build the secondary server component
    #[arg(long, env = "WITH_SERVER", value_parser = clap::builder::FalseyValueParser::new())]
    pub server: bool,

    /// Skip signature validation and the launch probe (the portability scan always runs)
    #[arg(long, env = "SKIP_CHECKS", value_parser = clap::builder::FalseyValueParser::new())]
    pub skip_checks: bool,

    /// Accept a toolkit from a package-manager layout
    #[arg(long, env = "ALLOW_DISTRUSTED_TOOLKIT", value_parser = clap::builder::FalseyValueParser::new())]
    pub allow_distrusted_toolkit: bool,

    /// Build output directory [default: <source>/build]
    #[arg(long, value_name = "DIR")]
    pub build_dir: Option<PathBuf>,

    /// Directory for the final archive [default: <source>/dist]
    #[arg(long, value_name = "DIR")]
    pub dist_dir: Option<PathBuf>,

    /// Pipeline manifest [default: <source>/bundle.toml]
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Target architecture: arm64, x86_64 or universal
    #[arg(long, value_name = "ARCH")]
    pub arch: Option<Arch>,

    /// Print every rewritten reference in the summary
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Manifest path and whether it was named explicitly.
    pub fn manifest_path(&self) -> (PathBuf, bool) {
        match &self.config {
            Some(path) => (path.clone(), true),
            None => (self.source.join(DEFAULT_MANIFEST), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_parse() {
        let args = Args::try_parse_from([
            "bundle_relocate",
            "--source",
            "/work/app",
            "--qt-root",
            "/Users/dev/Qt/6.7.3/macos",
            "--translations",
            "--arch",
            "universal",
        ])
        .unwrap();
        assert_eq!(args.qt_root, Some(PathBuf::from("/Users/dev/Qt/6.7.3/macos")));
        assert!(args.translations);
        assert!(!args.server);
        assert_eq!(args.arch, Some(Arch::Universal));
        assert_eq!(
            args.manifest_path(),
            (PathBuf::from("/work/app/bundle.toml"), false)
        );
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        let args = Args::try_parse_from(["bundle_relocate", "-v"]).unwrap();
        assert!(args.verbose);
        assert!(!args.quiet);
        assert!(Args::try_parse_from(["bundle_relocate", "-v", "-q"]).is_err());
    }

    #[test]
    fn bad_arch_is_rejected() {
        assert!(Args::try_parse_from(["bundle_relocate", "--arch", "ppc"]).is_err());
    }
}
