//! Host platform identification.
//!
//! Bundled native binaries live under resource paths of the form
//! `/{namespace}/native/{os}/{arch}/libfoo.so`. This module produces the
//! `{os}/{arch}` half of that path: a canonical, path-safe token pair derived
//! from whatever strings the host reports for its operating system and
//! processor architecture.
//!
//! Canonicalization is a pure string mapping and never fails. Vendor
//! spellings collapse onto one token per family (`amd64`, `em64t` and
//! `universal` all become `x86_64`), and anything unrecognized falls through
//! sanitized rather than rejected, so a new platform degrades to a missing
//! resource instead of a hard error.

use std::fmt;

use crate::probe::AbiProbe;

/// Canonical OS tokens, matched as case-sensitive substrings of the raw name.
const OS_TOKENS: [&str; 4] = ["Windows", "Mac", "Linux", "AIX"];

/// A canonical `{os}/{arch}` pair.
///
/// Values are normally derived from the host via [`Platform::current`], but
/// any pair can be constructed directly with [`Platform::new`] to resolve
/// resources for a foreign platform (packaging tools, tests).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Platform {
    os: String,
    arch: String,
}

impl Platform {
    /// Builds a platform from already-canonical tokens, bypassing
    /// canonicalization entirely.
    pub fn new(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Identifies the platform this process is running on.
    ///
    /// The ARM float-ABI `probe` is only consulted on 32-bit ARM Linux
    /// hosts; everywhere else it is ignored.
    pub fn current(probe: &dyn AbiProbe) -> Self {
        let os = match std::env::consts::OS {
            "windows" => "Windows".to_string(),
            "macos" => "Mac".to_string(),
            "linux" => "Linux".to_string(),
            "aix" => "AIX".to_string(),
            other => sanitize(other),
        };
        let arch = canonical_arch(&os, std::env::consts::ARCH, probe);
        Self { os, arch }
    }

    /// Canonicalizes raw host-reported OS and architecture strings.
    ///
    /// Deterministic for any input pair (modulo the ARM probe, which only
    /// fires for `arm*` on Linux).
    pub fn from_raw(os_raw: &str, arch_raw: &str, probe: &dyn AbiProbe) -> Self {
        let os = canonical_os(os_raw);
        let arch = canonical_arch(&os, arch_raw, probe);
        Self { os, arch }
    }

    /// The canonical OS token.
    pub fn os(&self) -> &str {
        &self.os
    }

    /// The canonical architecture token.
    pub fn arch(&self) -> &str {
        &self.arch
    }

    /// The `{os}/{arch}` folder fragment used inside resource paths.
    pub fn folder_path(&self) -> String {
        format!("{}/{}", self.os, self.arch)
    }

    /// Decorated filename of a bundled binary for this platform.
    ///
    /// A version becomes part of the stem: `libfoo-1.2.so`.
    pub fn library_filename(&self, name: &str, version: Option<&str>) -> String {
        let stem = decorated_stem(name, version);
        match self.os.as_str() {
            "Windows" => format!("{stem}.dll"),
            "Mac" => format!("lib{stem}.dylib"),
            _ => format!("lib{stem}.so"),
        }
    }

    /// Alternate filename under the older macOS `.jnilib` convention, which
    /// some bundles still ship. `None` everywhere but Mac.
    pub fn legacy_library_filename(&self, name: &str, version: Option<&str>) -> Option<String> {
        if self.os != "Mac" {
            return None;
        }
        Some(format!("lib{}.jnilib", decorated_stem(name, version)))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

fn decorated_stem(name: &str, version: Option<&str>) -> String {
    match version {
        Some(v) => format!("{name}-{v}"),
        None => name.to_string(),
    }
}

/// First canonical token appearing as a substring wins; otherwise the raw
/// name is sanitized and used as-is.
fn canonical_os(raw: &str) -> String {
    for token in OS_TOKENS {
        if raw.contains(token) {
            return token.to_string();
        }
    }
    sanitize(raw)
}

fn canonical_arch(os: &str, raw: &str, probe: &dyn AbiProbe) -> String {
    // 32-bit ARM on Linux splits into incompatible soft- and hard-float
    // flavors the alias table cannot distinguish.
    if os == "Linux" && raw.starts_with("arm") {
        if let Some(abi) = probe.arm_abi() {
            return abi;
        }
    }
    match arch_alias(raw) {
        Some(token) => token.to_string(),
        None => sanitize(raw),
    }
}

/// Collapses known vendor spellings onto canonical architecture tokens.
/// Matching is case-insensitive; unknown spellings yield `None`.
fn arch_alias(raw: &str) -> Option<&'static str> {
    let token = match raw.to_ascii_lowercase().as_str() {
        "x86" | "i386" | "i486" | "i586" | "i686" | "pentium" => "x86",
        "x86_64" | "amd64" | "em64t" | "universal" => "x86_64",
        "ia64" | "ia64w" => "ia64",
        "ia64_32" | "ia64n" => "ia64_32",
        "ppc" | "power" | "powerpc" | "power_pc" | "power_rs" => "ppc",
        "ppc64" | "power64" | "powerpc64" | "power_pc64" | "power_rs64" => "ppc64",
        _ => return None,
    };
    Some(token)
}

/// Strips everything but ASCII alphanumerics and underscores, keeping the
/// result safe to embed in a resource path.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::NoProbe;

    struct FixedProbe(Option<&'static str>);

    impl AbiProbe for FixedProbe {
        fn arm_abi(&self) -> Option<String> {
            self.0.map(str::to_string)
        }
    }

    #[test]
    fn os_substring_matching() {
        assert_eq!(Platform::from_raw("Windows 10", "x86", &NoProbe).os(), "Windows");
        assert_eq!(Platform::from_raw("Mac OS X", "x86", &NoProbe).os(), "Mac");
        assert_eq!(Platform::from_raw("Linux", "x86", &NoProbe).os(), "Linux");
        assert_eq!(Platform::from_raw("AIX", "ppc", &NoProbe).os(), "AIX");
    }

    #[test]
    fn os_matching_is_case_sensitive() {
        // "linux" does not contain the token "Linux"; it sanitizes instead.
        assert_eq!(Platform::from_raw("linux", "x86", &NoProbe).os(), "linux");
        assert_eq!(Platform::from_raw("SunOS 5.11", "x86", &NoProbe).os(), "SunOS511");
    }

    #[test]
    fn arch_alias_families() {
        for raw in ["x86", "i386", "i486", "i586", "i686", "pentium"] {
            assert_eq!(Platform::from_raw("Linux", raw, &NoProbe).arch(), "x86", "{raw}");
        }
        for raw in ["x86_64", "amd64", "em64t", "universal"] {
            assert_eq!(Platform::from_raw("Linux", raw, &NoProbe).arch(), "x86_64", "{raw}");
        }
        assert_eq!(Platform::from_raw("Linux", "ia64w", &NoProbe).arch(), "ia64");
        assert_eq!(Platform::from_raw("Linux", "ia64n", &NoProbe).arch(), "ia64_32");
        for raw in ["power", "powerpc", "power_pc", "power_rs"] {
            assert_eq!(Platform::from_raw("AIX", raw, &NoProbe).arch(), "ppc", "{raw}");
        }
        for raw in ["power64", "powerpc64", "power_pc64", "power_rs64"] {
            assert_eq!(Platform::from_raw("AIX", raw, &NoProbe).arch(), "ppc64", "{raw}");
        }
    }

    #[test]
    fn arch_aliases_ignore_case() {
        assert_eq!(Platform::from_raw("Linux", "AMD64", &NoProbe).arch(), "x86_64");
        assert_eq!(Platform::from_raw("Linux", "PowerPC", &NoProbe).arch(), "ppc");
    }

    #[test]
    fn unknown_arch_sanitizes() {
        assert_eq!(Platform::from_raw("Linux", "risc-v 64!", &NoProbe).arch(), "riscv64");
        assert_eq!(Platform::from_raw("Linux", "sparc_v9", &NoProbe).arch(), "sparc_v9");
    }

    #[test]
    fn arm_probe_only_fires_on_linux() {
        let probe = FixedProbe(Some("armhf"));
        assert_eq!(Platform::from_raw("Linux", "armv7l", &probe).arch(), "armhf");
        assert_eq!(Platform::from_raw("Linux", "arm", &probe).arch(), "armhf");
        // Same raw arch off Linux: the probe is not consulted.
        assert_eq!(Platform::from_raw("Windows CE", "armv7l", &probe).arch(), "armv7l");
        // Non-ARM arch on Linux: the probe result is irrelevant.
        assert_eq!(Platform::from_raw("Linux", "amd64", &probe).arch(), "x86_64");
    }

    #[test]
    fn arm_probe_failure_falls_back() {
        let platform = Platform::from_raw("Linux", "armv6l", &FixedProbe(None));
        assert_eq!(platform.arch(), "armv6l");
    }

    #[test]
    fn canonicalization_is_deterministic() {
        let a = Platform::from_raw("Windows Server 2019", "em64t", &NoProbe);
        let b = Platform::from_raw("Windows Server 2019", "em64t", &NoProbe);
        assert_eq!(a, b);
        assert_eq!(a.folder_path(), "Windows/x86_64");
    }

    #[test]
    fn current_yields_nonempty_tokens() {
        let platform = Platform::current(&NoProbe);
        assert!(!platform.os().is_empty());
        assert!(!platform.arch().is_empty());
        assert!(!platform.os().contains('/'));
        assert!(!platform.arch().contains('/'));
    }

    #[test]
    fn display_matches_folder_path() {
        let platform = Platform::new("Linux", "x86_64");
        assert_eq!(platform.to_string(), "Linux/x86_64");
        assert_eq!(platform.to_string(), platform.folder_path());
    }

    #[test]
    fn library_filenames_per_os() {
        let linux = Platform::new("Linux", "x86_64");
        let mac = Platform::new("Mac", "x86_64");
        let windows = Platform::new("Windows", "x86");
        let aix = Platform::new("AIX", "ppc64");

        assert_eq!(linux.library_filename("foo", None), "libfoo.so");
        assert_eq!(mac.library_filename("foo", None), "libfoo.dylib");
        assert_eq!(windows.library_filename("foo", None), "foo.dll");
        assert_eq!(aix.library_filename("foo", None), "libfoo.so");
    }

    #[test]
    fn versions_decorate_the_stem() {
        let linux = Platform::new("Linux", "x86_64");
        assert_eq!(linux.library_filename("foo", Some("2.1")), "libfoo-2.1.so");
    }

    #[test]
    fn legacy_filename_is_mac_only() {
        let mac = Platform::new("Mac", "x86_64");
        assert_eq!(
            mac.legacy_library_filename("foo", None).as_deref(),
            Some("libfoo.jnilib")
        );
        assert_eq!(Platform::new("Linux", "x86_64").legacy_library_filename("foo", None), None);
        assert_eq!(Platform::new("Windows", "x86").legacy_library_filename("foo", None), None);
    }
}
