//! Target architecture for the bundle build.

use std::fmt;
use std::str::FromStr;

/// CPU architecture the bundle is built for.
///
/// Pinned per run and passed to CMake as `CMAKE_OSX_ARCHITECTURES`.
///
/// # Examples
///
/// ```
/// use bundle_relocate::bundler::Arch;
///
/// let arch: Arch = "arm64".parse().unwrap();
/// assert_eq!(arch, Arch::AArch64);
/// assert_eq!(arch.cmake_architectures(), "arm64");
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    /// x86_64 (Intel Macs)
    X86_64,
    /// arm64 (Apple Silicon)
    #[default]
    #[serde(alias = "arm64")]
    AArch64,
    /// Fat binary containing both x86_64 and arm64 slices
    Universal,
}

impl Arch {
    /// Value for `CMAKE_OSX_ARCHITECTURES`.
    pub fn cmake_architectures(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::AArch64 => "arm64",
            Arch::Universal => "arm64;x86_64",
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Arch::X86_64 => "x86_64",
            Arch::AArch64 => "arm64",
            Arch::Universal => "universal",
        };
        f.write_str(name)
    }
}

impl FromStr for Arch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "x86_64" | "x86-64" | "amd64" => Ok(Arch::X86_64),
            "arm64" | "aarch64" => Ok(Arch::AArch64),
            "universal" => Ok(Arch::Universal),
            other => Err(format!(
                "unsupported architecture `{other}` (expected arm64, x86_64 or universal)"
            )),
        }
    }
}
