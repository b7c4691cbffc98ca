// src/config/mod.rs

//! Build configuration model
//!
//! Settings are the externally supplied platform/toolchain axes (operating
//! system, architecture, compiler, build type); options are per-recipe knobs
//! with defaults and legal values. [`BuildConfig`] is the resolved tuple of
//! both, constructed once per build request and passed immutably through
//! every pipeline stage.

pub mod prune;
pub mod validate;

use crate::error::{Error, Result};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Target operating system axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Linux,
    Windows,
    Macos,
    FreeBsd,
}

impl Os {
    /// Get the string representation of the operating system
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::FreeBsd => "freebsd",
        }
    }

    /// Parse an operating system name (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "linux" => Some(Self::Linux),
            "windows" => Some(Self::Windows),
            "macos" | "darwin" => Some(Self::Macos),
            "freebsd" => Some(Self::FreeBsd),
            _ => None,
        }
    }

    /// Platform capabilities, resolved once and carried with the model
    ///
    /// Downstream components branch on these flags instead of re-detecting
    /// the platform from strings.
    pub fn capabilities(&self) -> PlatformCaps {
        match self {
            Self::Windows => PlatformCaps {
                executable_bit: false,
                symlinks: false,
                exe_suffix: ".exe",
                path_separator: ';',
            },
            _ => PlatformCaps {
                executable_bit: true,
                symlinks: true,
                exe_suffix: "",
                path_separator: ':',
            },
        }
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the target platform can express on its filesystem
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCaps {
    /// Whether files carry an executable permission bit
    pub executable_bit: bool,
    /// Whether symbolic links are reliable on this platform
    pub symlinks: bool,
    /// Suffix appended to executable file names
    pub exe_suffix: &'static str,
    /// Separator for PATH-style environment lists
    pub path_separator: char,
}

/// Target CPU architecture axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Armv8,
}

impl Arch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::X86_64 => "x86_64",
            Self::Armv8 => "armv8",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "x86" => Some(Self::X86),
            "x86_64" | "amd64" => Some(Self::X86_64),
            "armv8" | "aarch64" => Some(Self::Armv8),
            _ => None,
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build type axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildType {
    Debug,
    Release,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Release => "release",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "release" => Some(Self::Release),
            _ => None,
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Compiler family axis
///
/// The set is open: recipes cannot enumerate every toolchain, so an
/// unrecognized family is carried verbatim instead of being rejected at
/// parse time. Whether an unknown family builds is the validator's call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompilerFamily {
    Gcc,
    Clang,
    AppleClang,
    Msvc,
    Unknown(String),
}

impl CompilerFamily {
    /// Parse a compiler family name (case-insensitive)
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "gcc" => Self::Gcc,
            "clang" => Self::Clang,
            "apple-clang" => Self::AppleClang,
            "msvc" | "visual studio" => Self::Msvc,
            _ => Self::Unknown(s.to_string()),
        }
    }

    /// Get the canonical family name
    pub fn name(&self) -> &str {
        match self {
            Self::Gcc => "gcc",
            Self::Clang => "clang",
            Self::AppleClang => "apple-clang",
            Self::Msvc => "msvc",
            Self::Unknown(name) => name,
        }
    }

    /// Whether the family is one the engine has compatibility data for
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiler identity and version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Compiler {
    pub family: CompilerFamily,
    pub version: Version,
}

impl Compiler {
    pub fn new(family: CompilerFamily, version: Version) -> Self {
        Self { family, version }
    }
}

impl fmt::Display for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.version)
    }
}

/// Externally supplied settings, immutable once validation begins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub os: Os,
    pub arch: Arch,
    pub compiler: Compiler,
    pub build_type: BuildType,
    /// Pinned language standard, e.g. "17"; absent when the profile does
    /// not request one
    pub cppstd: Option<String>,
    /// Standard-library variant, e.g. "libstdc++11"
    pub libcxx: Option<String>,
}

impl Settings {
    pub fn capabilities(&self) -> PlatformCaps {
        self.os.capabilities()
    }
}

/// A single resolved option value: boolean or enumerated choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Choice(String),
}

impl OptionValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Choice(_) => None,
        }
    }

    /// Render the value for flag synthesis and fingerprinting
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Choice(s) => s.clone(),
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render())
    }
}

/// A declared option with its default and legal values
#[derive(Debug, Clone, Deserialize)]
pub struct OptionDecl {
    pub name: String,
    /// Legal enumerated values; empty means the option is boolean
    #[serde(default)]
    pub choices: Vec<String>,
    pub default: OptionValue,
}

impl OptionDecl {
    /// Check whether a value is legal for this option
    pub fn is_legal(&self, value: &OptionValue) -> bool {
        match value {
            OptionValue::Bool(_) => self.choices.is_empty(),
            OptionValue::Choice(s) => self.choices.iter().any(|c| c == s),
        }
    }
}

/// The resolved configuration model: settings plus options after defaults
/// and overrides, with pruned axes tracked so they can never reappear
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
    pub settings: Settings,
    options: BTreeMap<String, OptionValue>,
    removed: BTreeSet<String>,
}

impl BuildConfig {
    /// Resolve a model from declared options plus user overrides
    ///
    /// Defaults fill unspecified options. Unknown option names and illegal
    /// values are configuration errors, surfaced before any side effect.
    pub fn resolve(
        decls: &[OptionDecl],
        settings: Settings,
        overrides: &BTreeMap<String, OptionValue>,
    ) -> Result<Self> {
        let mut options = BTreeMap::new();
        for decl in decls {
            options.insert(decl.name.clone(), decl.default.clone());
        }

        for (name, value) in overrides {
            let decl = decls.iter().find(|d| d.name == *name).ok_or_else(|| {
                Error::UnsupportedConfiguration(format!("unknown option '{}'", name))
            })?;
            if !decl.is_legal(value) {
                return Err(Error::UnsupportedConfiguration(format!(
                    "value '{}' is not legal for option '{}'",
                    value, name
                )));
            }
            options.insert(name.clone(), value.clone());
        }

        Ok(Self {
            settings,
            options,
            removed: BTreeSet::new(),
        })
    }

    /// Look up an option; removed options are absent
    pub fn option(&self, name: &str) -> Option<&OptionValue> {
        self.options.get(name)
    }

    /// Look up a boolean option
    pub fn bool_option(&self, name: &str) -> Option<bool> {
        self.option(name).and_then(OptionValue::as_bool)
    }

    /// Iterate the surviving options in name order
    pub fn options(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether an option axis was pruned from this model
    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.contains(name)
    }

    /// Remove an option axis; once removed it cannot reappear
    pub(crate) fn remove_option(&mut self, name: &str) {
        if self.options.remove(name).is_some() {
            self.removed.insert(name.to_string());
        }
    }

    pub fn capabilities(&self) -> PlatformCaps {
        self.settings.capabilities()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linux_gcc9() -> Settings {
        Settings {
            os: Os::Linux,
            arch: Arch::X86_64,
            compiler: Compiler::new(CompilerFamily::Gcc, Version::parse("9").unwrap()),
            build_type: BuildType::Release,
            cppstd: None,
            libcxx: None,
        }
    }

    fn sample_decls() -> Vec<OptionDecl> {
        vec![
            OptionDecl {
                name: "shared".to_string(),
                choices: vec![],
                default: OptionValue::Bool(false),
            },
            OptionDecl {
                name: "crypto".to_string(),
                choices: vec!["openssl".to_string(), "mbedtls".to_string()],
                default: OptionValue::Choice("openssl".to_string()),
            },
        ]
    }

    // === Axis parsing ===

    #[test]
    fn test_os_parse_case_insensitive() {
        assert_eq!(Os::parse("Windows"), Some(Os::Windows));
        assert_eq!(Os::parse("LINUX"), Some(Os::Linux));
        assert_eq!(Os::parse("darwin"), Some(Os::Macos));
        assert_eq!(Os::parse("plan9"), None);
    }

    #[test]
    fn test_compiler_family_open_set() {
        assert_eq!(CompilerFamily::parse("gcc"), CompilerFamily::Gcc);
        assert_eq!(CompilerFamily::parse("Visual Studio"), CompilerFamily::Msvc);
        let odd = CompilerFamily::parse("tcc");
        assert_eq!(odd, CompilerFamily::Unknown("tcc".to_string()));
        assert!(!odd.is_known());
        assert_eq!(odd.name(), "tcc");
    }

    #[test]
    fn test_platform_caps() {
        assert!(Os::Linux.capabilities().executable_bit);
        assert!(Os::Linux.capabilities().symlinks);
        assert_eq!(Os::Linux.capabilities().exe_suffix, "");

        let win = Os::Windows.capabilities();
        assert!(!win.executable_bit);
        assert!(!win.symlinks);
        assert_eq!(win.exe_suffix, ".exe");
        assert_eq!(win.path_separator, ';');
    }

    // === Option declarations ===

    #[test]
    fn test_option_decl_legality() {
        let decls = sample_decls();
        assert!(decls[0].is_legal(&OptionValue::Bool(true)));
        assert!(!decls[0].is_legal(&OptionValue::Choice("yes".to_string())));
        assert!(decls[1].is_legal(&OptionValue::Choice("mbedtls".to_string())));
        assert!(!decls[1].is_legal(&OptionValue::Choice("nss".to_string())));
        assert!(!decls[1].is_legal(&OptionValue::Bool(true)));
    }

    // === Model resolution ===

    #[test]
    fn test_resolve_defaults() {
        let config = BuildConfig::resolve(&sample_decls(), linux_gcc9(), &BTreeMap::new()).unwrap();
        assert_eq!(config.bool_option("shared"), Some(false));
        assert_eq!(
            config.option("crypto"),
            Some(&OptionValue::Choice("openssl".to_string()))
        );
    }

    #[test]
    fn test_resolve_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("shared".to_string(), OptionValue::Bool(true));
        let config = BuildConfig::resolve(&sample_decls(), linux_gcc9(), &overrides).unwrap();
        assert_eq!(config.bool_option("shared"), Some(true));
    }

    #[test]
    fn test_resolve_unknown_option() {
        let mut overrides = BTreeMap::new();
        overrides.insert("with_tls".to_string(), OptionValue::Bool(true));
        let err = BuildConfig::resolve(&sample_decls(), linux_gcc9(), &overrides).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_resolve_illegal_value() {
        let mut overrides = BTreeMap::new();
        overrides.insert("crypto".to_string(), OptionValue::Choice("nss".to_string()));
        let err = BuildConfig::resolve(&sample_decls(), linux_gcc9(), &overrides).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration(_)));
    }

    #[test]
    fn test_removed_option_is_gone() {
        let mut config =
            BuildConfig::resolve(&sample_decls(), linux_gcc9(), &BTreeMap::new()).unwrap();
        config.remove_option("shared");
        assert!(config.option("shared").is_none());
        assert!(config.is_removed("shared"));
        // removing an undeclared name is not recorded
        config.remove_option("nonexistent");
        assert!(!config.is_removed("nonexistent"));
    }
}
