//! Shared fixtures for integration tests.
//!
//! Binaries are plain text files carrying `# link: <path>` lines, so the
//! inspector and rewriter fakes can work on any host without Mach-O tooling.
#![allow(dead_code)]

use bundle_relocate::bundler::settings::{PipelineManifest, VersionPair};
use bundle_relocate::bundler::toolkit::{PackageManager, PrefixClassifier};
use bundle_relocate::bundler::tools::{
    BinaryInspector, CodeSigner, ImageArchiver, ReferenceRewriter, Tarball,
};
use bundle_relocate::bundler::{Error, Result, Settings, SettingsBuilder, Toolset};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const LINK_MARKER: &str = "# link: ";
pub const DISTRUSTED: &str = "/distrusted";

/// Reads `# link:` lines.
pub struct TextInspector;

impl BinaryInspector for TextInspector {
    fn linked_libraries(&self, binary: &Path) -> Result<Vec<String>> {
        let contents = std::fs::read(binary)?;
        Ok(String::from_utf8_lossy(&contents)
            .lines()
            .filter_map(|line| line.strip_prefix(LINK_MARKER))
            .map(str::to_string)
            .collect())
    }
}

/// Replaces a `# link:` line in place.
pub struct TextRewriter;

impl ReferenceRewriter for TextRewriter {
    fn change_reference(&self, binary: &Path, old: &str, new: &str) -> Result<()> {
        let contents = std::fs::read_to_string(binary)?;
        let from = format!("{LINK_MARKER}{old}");
        if !contents.lines().any(|l| l == from) {
            return Err(Error::GenericError(format!("{old} not referenced")));
        }
        let rewritten: Vec<String> = contents
            .lines()
            .map(|l| {
                if l == from {
                    format!("{LINK_MARKER}{new}")
                } else {
                    l.to_string()
                }
            })
            .collect();
        std::fs::write(binary, rewritten.join("\n") + "\n")?;
        Ok(())
    }
}

/// Always rejects the change.
pub struct FailingRewriter;

impl ReferenceRewriter for FailingRewriter {
    fn change_reference(&self, _binary: &Path, old: &str, _new: &str) -> Result<()> {
        Err(Error::GenericError(format!("cannot rewrite {old}")))
    }
}

/// Drops a signature marker into the bundle.
pub struct MarkerSigner;

impl CodeSigner for MarkerSigner {
    fn sign_ad_hoc(&self, bundle: &Path) -> Result<()> {
        let dir = bundle.join("Contents/_CodeSignature");
        std::fs::create_dir_all(&dir)?;
        std::fs::write(dir.join("CodeResources"), b"ad-hoc")?;
        Ok(())
    }

    fn validate(&self, bundle: &Path) -> Result<()> {
        if bundle.join("Contents/_CodeSignature/CodeResources").is_file() {
            Ok(())
        } else {
            Err(Error::SigningFailure {
                bundle: bundle.to_path_buf(),
                reason: "not signed".into(),
            })
        }
    }
}

/// [`MarkerSigner`] that counts `validate` calls.
pub struct CountingSigner(pub Arc<AtomicUsize>);

impl CodeSigner for CountingSigner {
    fn sign_ad_hoc(&self, bundle: &Path) -> Result<()> {
        MarkerSigner.sign_ad_hoc(bundle)
    }

    fn validate(&self, bundle: &Path) -> Result<()> {
        self.0.fetch_add(1, Ordering::SeqCst);
        MarkerSigner.validate(bundle)
    }
}

/// Package manager returning a fixed prefix.
pub struct FixedPackageManager(pub Option<PathBuf>);

impl PackageManager for FixedPackageManager {
    fn name(&self) -> &str {
        "fake-brew"
    }

    fn query_prefix(&self, _package: &str) -> Option<PathBuf> {
        self.0.clone()
    }
}

pub fn toolset() -> Toolset {
    Toolset {
        inspector: Box::new(TextInspector),
        rewriter: Box::new(TextRewriter),
        signer: Box::new(MarkerSigner),
        archiver: Box::new(Tarball) as Box<dyn ImageArchiver>,
        package_manager: Box::new(FixedPackageManager(None)),
    }
}

pub fn classifier() -> PrefixClassifier {
    PrefixClassifier::new(&[DISTRUSTED.to_string()])
}

/// Manifest with no network modules, no pinned install and `/distrusted`
/// as the only distrusted prefix.
pub fn manifest() -> PipelineManifest {
    let mut manifest = PipelineManifest::default();
    manifest.toolkit.pinned_root = None;
    manifest.toolkit.distrusted_prefixes = vec![DISTRUSTED.to_string()];
    manifest.deploy.package_manager_library_globs = Vec::new();
    manifest.external_modules = Vec::new();
    manifest
}

pub fn settings(source: &Path, manifest: PipelineManifest, qt_root: Option<PathBuf>) -> Settings {
    SettingsBuilder::new()
        .manifest(manifest)
        .source_dir(source)
        .version(VersionPair { major: 4, minor: 1 })
        .toolkit_override(qt_root)
        .build()
        .unwrap()
}

pub fn write_binary(path: &Path, links: &[&str], mode: u32) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut body = String::from("#!/bin/sh\n");
    for link in links {
        body.push_str(LINK_MARKER);
        body.push_str(link);
        body.push('\n');
    }
    body.push_str("exit 0\n");
    std::fs::write(path, body).unwrap();
    set_mode(path, mode);
}

#[cfg(unix)]
pub fn set_mode(path: &Path, mode: u32) {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).unwrap();
}

#[cfg(not(unix))]
pub fn set_mode(_path: &Path, _mode: u32) {}

/// `App.app` linking `/distrusted/lib/libfoo.dylib`, with a bundled copy.
pub fn deployed_bundle(root: &Path) -> PathBuf {
    let bundle = root.join("App.app");
    write_binary(
        &bundle.join("Contents/MacOS/App"),
        &[
            "/distrusted/lib/libfoo.dylib",
            "/usr/lib/libSystem.B.dylib",
        ],
        0o755,
    );
    write_binary(
        &bundle.join("Contents/Frameworks/libfoo.dylib"),
        &["/usr/lib/libc++.1.dylib"],
        0o444,
    );
    bundle
}

/// Toolkit root with a shell-script deployer that copies `libfoo.dylib` into
/// the bundle and exits with `deploy_exit`.
pub fn fake_toolkit(root: &Path, deploy_exit: i32) -> PathBuf {
    let qt = root.join("qt");
    std::fs::create_dir_all(qt.join("lib/QtCore.framework")).unwrap();
    let deployer = qt.join("bin/macdeployqt");
    std::fs::create_dir_all(deployer.parent().unwrap()).unwrap();
    std::fs::write(
        &deployer,
        format!(
            "#!/bin/sh\n\
             mkdir -p \"$1/Contents/Frameworks\"\n\
             printf '{LINK_MARKER}/usr/lib/libc++.1.dylib\\n' > \"$1/Contents/Frameworks/libfoo.dylib\"\n\
             exit {deploy_exit}\n"
        ),
    )
    .unwrap();
    set_mode(&deployer, 0o755);
    qt
}

/// CMake stand-in that records its invocation in `marker` and, on
/// `--build`, produces `<build>/bin/App.app` linking the distrusted libfoo.
pub fn fake_cmake(root: &Path, marker: &Path) -> PathBuf {
    let cmake = root.join("fake-cmake");
    std::fs::write(
        &cmake,
        format!(
            "#!/bin/sh\n\
             echo \"$@\" >> \"{marker}\"\n\
             if [ \"$1\" = \"--build\" ]; then\n\
             \x20 app=\"$2/bin/App.app/Contents/MacOS\"\n\
             \x20 mkdir -p \"$app\"\n\
             \x20 printf '#!/bin/sh\\n{LINK_MARKER}{DISTRUSTED}/lib/libfoo.dylib\\nexit 0\\n' > \"$app/App\"\n\
             \x20 chmod 555 \"$app/App\"\n\
             fi\n\
             exit 0\n",
            marker = marker.display()
        ),
    )
    .unwrap();
    set_mode(&cmake, 0o755);
    cmake
}
