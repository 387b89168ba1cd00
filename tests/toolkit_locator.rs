//! Toolkit resolution order and trust gating.

mod common;

use bundle_relocate::bundler::toolkit::{ToolkitLocator, gate};
use bundle_relocate::bundler::{Error, LayoutClass, ToolkitOrigin};
use common::*;
use std::path::{Path, PathBuf};

fn complete_kit(path: &Path) {
    std::fs::create_dir_all(path.join("bin")).unwrap();
    std::fs::create_dir_all(path.join("lib/QtCore.framework")).unwrap();
    std::fs::write(path.join("bin/macdeployqt"), b"").unwrap();
}

#[test]
fn newest_installer_kit_wins_numerically() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("home");
    for version in ["6.9.0", "6.10.0", "6.2.1"] {
        std::fs::create_dir_all(home.join("Qt").join(version).join("macos")).unwrap();
    }

    let settings = settings(dir.path(), manifest(), None);
    let classifier = classifier();
    let pm = FixedPackageManager(None);
    let root = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(Some(home.clone()))
        .locate()
        .unwrap();

    assert_eq!(root.path(), home.join("Qt/6.10.0/macos"));
    assert_eq!(root.origin(), ToolkitOrigin::HomeDirectoryScan);
    assert_eq!(root.trust(), LayoutClass::Preferred);
}

#[test]
fn explicit_override_beats_everything() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("home");
    std::fs::create_dir_all(home.join("Qt/6.7.3/macos")).unwrap();
    let custom = dir.path().join("custom-qt");
    std::fs::create_dir_all(&custom).unwrap();

    let settings = settings(dir.path(), manifest(), Some(custom.clone()));
    let classifier = classifier();
    let pm = FixedPackageManager(None);
    let root = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(Some(home))
        .locate()
        .unwrap();

    assert_eq!(root.path(), custom);
    assert_eq!(root.origin(), ToolkitOrigin::ExplicitOverride);
}

#[test]
fn missing_override_does_not_fall_through() {
    let dir = tempfile::tempdir().unwrap();
    let home = dir.path().join("home");
    std::fs::create_dir_all(home.join("Qt/6.7.3/macos")).unwrap();

    let settings = settings(dir.path(), manifest(), Some(dir.path().join("nope")));
    let classifier = classifier();
    let pm = FixedPackageManager(None);
    let err = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(Some(home))
        .locate()
        .unwrap_err();
    assert!(matches!(err, Error::ToolkitUnresolved { .. }));
}

#[test]
fn pinned_install_is_implicitly_allowed() {
    let dir = tempfile::tempdir().unwrap();
    let pinned = dir.path().join("brew/Cellar/qt/6.7.3");
    std::fs::create_dir_all(&pinned).unwrap();

    let mut manifest = manifest();
    manifest.toolkit.pinned_root = Some(pinned.clone());
    manifest.toolkit.distrusted_prefixes = vec![dir.path().join("brew").display().to_string()];
    let settings = settings(dir.path(), manifest.clone(), None);
    let classifier =
        bundle_relocate::bundler::toolkit::PrefixClassifier::new(&manifest.toolkit.distrusted_prefixes);
    let pm = FixedPackageManager(None);

    let root = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(None)
        .locate()
        .unwrap();
    assert_eq!(root.origin(), ToolkitOrigin::PinnedPackageManager);
    assert_eq!(root.trust(), LayoutClass::AllowedWithOverride);
    assert!(root.implicitly_allowed());
    assert!(gate(&root, false).is_ok());
}

#[test]
fn package_manager_prefix_needs_expected_layout() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("distrusted-qt");
    std::fs::create_dir_all(&prefix).unwrap();

    let settings = settings(dir.path(), manifest(), None);
    let classifier = classifier();

    let pm = FixedPackageManager(Some(prefix.clone()));
    let err = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(None)
        .locate()
        .unwrap_err();
    assert!(err.to_string().contains("missing bin/macdeployqt"));

    complete_kit(&prefix);
    let root = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(None)
        .locate()
        .unwrap();
    assert_eq!(root.origin(), ToolkitOrigin::PackageManagerQuery);
}

#[test]
fn queried_distrusted_prefix_requires_opt_in() {
    let dir = tempfile::tempdir().unwrap();
    let prefix = dir.path().join("brew/opt/qt");
    complete_kit(&prefix);

    let mut manifest = manifest();
    manifest.toolkit.distrusted_prefixes = vec![dir.path().join("brew").display().to_string()];
    let settings = settings(dir.path(), manifest.clone(), None);
    let classifier =
        bundle_relocate::bundler::toolkit::PrefixClassifier::new(&manifest.toolkit.distrusted_prefixes);
    let pm = FixedPackageManager(Some(prefix));

    let root = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(None)
        .locate()
        .unwrap();
    assert!(root.requires_opt_in());
    assert!(matches!(
        gate(&root, false),
        Err(Error::UntrustedLayout {
            class: LayoutClass::AllowedWithOverride,
            ..
        })
    ));
    assert!(gate(&root, true).is_ok());
}

#[test]
fn unresolved_lists_every_source() {
    let dir = tempfile::tempdir().unwrap();
    let mut manifest = manifest();
    manifest.toolkit.pinned_root = Some(PathBuf::from("/nonexistent/Cellar/qt/6.7.3"));
    let settings = settings(dir.path(), manifest, None);
    let classifier = classifier();
    let pm = FixedPackageManager(None);

    let err = ToolkitLocator::new(&settings, &pm, &classifier)
        .with_home(Some(dir.path().join("home")))
        .locate()
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("QT_ROOT (unset)"));
    assert!(message.contains("/nonexistent/Cellar/qt/6.7.3 (not installed)"));
    assert!(message.contains("fake-brew --prefix qt (not installed)"));
    assert!(message.contains("--allow-distrusted-toolkit"));
}
