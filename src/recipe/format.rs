// src/recipe/format.rs

//! Recipe declaration format
//!
//! Recipes are TOML documents describing how to obtain, configure, build,
//! and package one third-party library: per-version sources and patches,
//! option declarations, pruning and validation rules, conditional
//! requirements, the fingerprint declaration, and the exported component
//! graph. One generic pipeline consumes these records; there is no
//! per-package code.

use crate::config::prune::PruneRule;
use crate::config::validate::ValidationRules;
use crate::config::{BuildConfig, OptionDecl};
use crate::error::{Error, Result};
use crate::fingerprint::{Fingerprint, PackageKind, fingerprint};
use crate::version::Version;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

/// A complete recipe for one third-party library
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSpec {
    /// Package metadata
    pub package: PackageSection,

    /// Option declarations with legal values and defaults
    #[serde(default)]
    pub options: Vec<OptionDecl>,

    /// Conditional option pruning rules
    #[serde(default)]
    pub prune: Vec<PruneRule>,

    /// Compatibility rules checked before any side effect
    #[serde(default)]
    pub validation: ValidationRules,

    /// Conditionally included upstream requirements, in declaration order
    #[serde(default)]
    pub requirements: Vec<RequirementDecl>,

    /// Per-version source and patch entries
    pub versions: Vec<VersionEntry>,

    /// Configure flag synthesis
    #[serde(default)]
    pub build: BuildSection,

    /// Which axes feed the package identity
    #[serde(default)]
    pub fingerprint: FingerprintSection,

    /// Install layout rules
    #[serde(default)]
    pub packaging: PackagingSection,

    /// Exported component graph template
    #[serde(default)]
    pub components: Vec<ComponentTemplate>,

    /// Logical tool name (UPPERCASE) -> install-relative path, declared
    /// without the platform executable suffix
    #[serde(default)]
    pub tools: BTreeMap<String, String>,
}

impl RecipeSpec {
    /// Parse a recipe from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        let spec: RecipeSpec = toml::from_str(text)
            .map_err(|e| Error::ParseError(format!("invalid recipe: {}", e)))?;
        spec.check()?;
        Ok(spec)
    }

    /// Structural sanity checks on the declaration itself
    fn check(&self) -> Result<()> {
        if self.versions.is_empty() {
            return Err(Error::ParseError(format!(
                "recipe '{}' declares no versions",
                self.package.name
            )));
        }

        let mut names = BTreeSet::new();
        for entry in &self.versions {
            Version::parse(&entry.version)?;
        }
        for option in &self.options {
            if !names.insert(option.name.as_str()) {
                return Err(Error::ParseError(format!(
                    "duplicate option '{}' in recipe '{}'",
                    option.name, self.package.name
                )));
            }
        }
        for flag in &self.build.option_flags {
            if !names.contains(flag.option.as_str()) {
                return Err(Error::ParseError(format!(
                    "flag references undeclared option '{}'",
                    flag.option
                )));
            }
        }

        let mut components = BTreeSet::new();
        for component in &self.components {
            if !components.insert(component.name.as_str()) {
                return Err(Error::ParseError(format!(
                    "duplicate component '{}' in recipe '{}'",
                    component.name, self.package.name
                )));
            }
        }

        Ok(())
    }

    /// Look up the entry for an exact version
    ///
    /// There is no interpolation across versions: a version the recipe does
    /// not declare cannot be built.
    pub fn entry(&self, version: &str) -> Result<&VersionEntry> {
        self.versions
            .iter()
            .find(|e| e.version == version)
            .ok_or_else(|| {
                Error::UnsupportedConfiguration(format!(
                    "version '{}' is not declared by recipe '{}'",
                    version, self.package.name
                ))
            })
    }

    /// Render the ordered configure flag list for a resolved model
    ///
    /// Base flags come first, then one flag per declared option in
    /// declaration order. Pruned options contribute nothing.
    pub fn configure_args(&self, config: &BuildConfig) -> Vec<String> {
        let mut args = self.build.base_flags.clone();
        for flag in &self.build.option_flags {
            let Some(value) = config.option(&flag.option) else {
                continue;
            };
            match value.as_bool() {
                Some(true) => {
                    if let Some(on) = &flag.on {
                        args.push(on.clone());
                    }
                }
                Some(false) => {
                    if let Some(off) = &flag.off {
                        args.push(off.clone());
                    }
                }
                None => {
                    if let Some(template) = &flag.value_flag {
                        args.push(template.replace("%(value)s", &value.render()));
                    }
                }
            }
        }
        args
    }

    /// Compute the package identity for a resolved model at a version
    pub fn fingerprint(&self, version: &str, config: &BuildConfig) -> Fingerprint {
        fingerprint(
            &self.package.name,
            version,
            self.fingerprint.kind,
            &self.fingerprint.irrelevant,
            config,
        )
    }
}

/// Package metadata section
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    #[serde(default)]
    pub homepage: Option<String>,
}

/// Source and patches for one recipe version
#[derive(Debug, Clone, Deserialize)]
pub struct VersionEntry {
    pub version: String,

    pub source: SourceSpec,

    /// Patches applied in declaration order, the same on every platform
    #[serde(default)]
    pub patches: Vec<PatchInfo>,
}

/// Where a version's source comes from and how it is verified
#[derive(Debug, Clone, Deserialize)]
pub struct SourceSpec {
    pub url: String,

    /// Checksum the fetcher must verify before handing back a tree
    pub sha256: String,
}

/// One declared patch
#[derive(Debug, Clone, Deserialize)]
pub struct PatchInfo {
    /// Patch file name, relative to the recipe's patch directory
    pub file: String,

    /// Leading path components stripped from diff headers (default: 1)
    #[serde(default = "default_strip")]
    pub strip: u32,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_strip() -> u32 {
    1
}

/// Configure flag synthesis rules
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildSection {
    /// Flags passed on every configure invocation
    #[serde(default)]
    pub base_flags: Vec<String>,

    /// Per-option flags, rendered in declaration order
    #[serde(default)]
    pub option_flags: Vec<OptionFlag>,
}

/// How one option maps onto configure flags
#[derive(Debug, Clone, Deserialize)]
pub struct OptionFlag {
    pub option: String,

    /// Flag emitted when a boolean option is enabled
    #[serde(default)]
    pub on: Option<String>,

    /// Flag emitted when a boolean option is disabled
    #[serde(default)]
    pub off: Option<String>,

    /// Template for enumerated options; `%(value)s` is substituted
    #[serde(default)]
    pub value_flag: Option<String>,
}

/// Which axes feed the package identity
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FingerprintSection {
    #[serde(default)]
    pub kind: PackageKind,

    /// Setting or option axes excluded from the identity, e.g. a language
    /// standard the library's ABI does not depend on
    #[serde(default)]
    pub irrelevant: Vec<String>,
}

/// Install layout rules
#[derive(Debug, Clone, Deserialize)]
pub struct PackagingSection {
    /// Glob patterns for license files at the source-tree root
    #[serde(default = "default_license_patterns")]
    pub license_patterns: Vec<String>,

    /// Install-relative directories the package does not ship
    #[serde(default)]
    pub remove_dirs: Vec<String>,

    /// Logical library names that must exist under lib/ after the build
    #[serde(default)]
    pub libraries: Vec<String>,
}

impl Default for PackagingSection {
    fn default() -> Self {
        Self {
            license_patterns: default_license_patterns(),
            remove_dirs: Vec::new(),
            libraries: Vec::new(),
        }
    }
}

fn default_license_patterns() -> Vec<String> {
    vec!["COPYING*".to_string(), "LICENSE*".to_string()]
}

/// A conditionally included upstream requirement
#[derive(Debug, Clone, Deserialize)]
pub struct RequirementDecl {
    pub package: String,

    pub version: String,

    /// Specific component of the upstream package, if not the default
    #[serde(default)]
    pub component: Option<String>,

    /// Included only when this boolean option is enabled
    #[serde(default)]
    pub when_option: Option<String>,
}

/// Template for one exported component
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentTemplate {
    pub name: String,

    /// Library file stems linked by consumers of this component
    #[serde(default)]
    pub libs: Vec<String>,

    /// Include search paths (default: "include")
    #[serde(default)]
    pub includedirs: Vec<String>,

    /// Unconditional requirement edges; "pkg::component" names an external
    /// package's component, a bare name an internal one
    #[serde(default)]
    pub requires: Vec<String>,

    /// Edges gained only when an option was enabled at build time
    #[serde(default)]
    pub conditional_requires: Vec<ConditionalEdge>,

    /// The whole component exists only when this option is enabled
    #[serde(default)]
    pub when_option: Option<String>,
}

/// Requirement edges a component gains when an option is enabled
#[derive(Debug, Clone, Deserialize)]
pub struct ConditionalEdge {
    pub when_option: String,
    pub requires: Vec<String>,
}
