//! Structural classification of toolkit installations.
//!
//! The deployer walks a toolkit's frameworks to find dependencies. Package
//! manager installs are symlink farms split across many prefixes, and the walk
//! breaks on them. Which layouts fall in that class is a path heuristic, kept
//! behind [`LayoutClassifier`] so the rule can change without touching the
//! pipeline.

use std::path::Path;

/// How far a toolkit layout can be trusted.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LayoutClass {
    /// Self-contained installer layout.
    Preferred,
    /// Known-unreliable layout; usable only with explicit opt-in.
    AllowedWithOverride,
    /// Cannot be used at all.
    Unsupported,
}

/// Decides the [`LayoutClass`] of a toolkit root.
pub trait LayoutClassifier: Send + Sync {
    fn classify(&self, root: &Path) -> LayoutClass;
}

/// Classifies by path prefix.
///
/// Roots under any distrusted prefix are [`LayoutClass::AllowedWithOverride`];
/// relative roots are [`LayoutClass::Unsupported`].
#[derive(Clone, Debug)]
pub struct PrefixClassifier {
    distrusted_prefixes: Vec<String>,
}

impl PrefixClassifier {
    pub fn new(distrusted_prefixes: &[String]) -> Self {
        Self {
            distrusted_prefixes: distrusted_prefixes.to_vec(),
        }
    }

    /// Whether `path` lies under one of the distrusted prefixes.
    ///
    /// Matches whole path components, so `/opt/homebrewed` is not under
    /// `/opt/homebrew`.
    pub fn is_distrusted(&self, path: &Path) -> bool {
        self.distrusted_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix))
    }
}

impl LayoutClassifier for PrefixClassifier {
    fn classify(&self, root: &Path) -> LayoutClass {
        if !root.is_absolute() {
            LayoutClass::Unsupported
        } else if self.is_distrusted(root) {
            LayoutClass::AllowedWithOverride
        } else {
            LayoutClass::Preferred
        }
    }
}
