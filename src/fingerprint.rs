// src/fingerprint.rs

//! Package identity computation
//!
//! Reduces a resolved configuration to the key that decides artifact reuse.
//! Compiled recipes hash the ABI-affecting axes minus the recipe-declared
//! irrelevant ones; header-only and artifact-only recipes collapse to a
//! constant per version, so one artifact serves every toolchain. Fingerprint
//! equality is the sole admission key into the package index.

use crate::config::BuildConfig;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

/// What a recipe produces, as far as binary compatibility is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageKind {
    /// Compiled code: toolchain and option axes shape the binary
    #[default]
    Compiled,
    /// Headers only: any toolchain consumes the same artifact
    HeaderOnly,
    /// Pre-built or repackaged content, independent of the consumer's
    /// toolchain
    ArtifactOnly,
}

impl PackageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Compiled => "compiled",
            Self::HeaderOnly => "header-only",
            Self::ArtifactOnly => "artifact-only",
        }
    }

    /// Whether the fingerprint carries any toolchain axes at all
    pub fn is_toolchain_dependent(&self) -> bool {
        matches!(self, Self::Compiled)
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A derived, order-independent key over the binary-relevant configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub(crate) fn from_payload(payload: &str) -> Self {
        let digest = Sha256::digest(payload.as_bytes());
        Self(hex::encode(digest))
    }

    /// The full hex digest
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A short prefix for log lines
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Compute the package identity for one resolved configuration
///
/// Axes are serialized in sorted order, so the result does not depend on
/// declaration order. Axes named in `irrelevant` are dropped before hashing;
/// pruned options never reach the payload because they are absent from the
/// model. For non-compiled kinds only the package name and version remain.
pub fn fingerprint(
    name: &str,
    version: &str,
    kind: PackageKind,
    irrelevant: &[String],
    config: &BuildConfig,
) -> Fingerprint {
    let mut payload = format!("name:{}\nversion:{}\n", name, version);

    if !kind.is_toolchain_dependent() {
        payload.push_str("kind:");
        payload.push_str(kind.as_str());
        payload.push('\n');
        return Fingerprint::from_payload(&payload);
    }

    let settings = &config.settings;
    let mut axes: BTreeMap<String, String> = BTreeMap::new();
    axes.insert("os".to_string(), settings.os.as_str().to_string());
    axes.insert("arch".to_string(), settings.arch.as_str().to_string());
    axes.insert(
        "build_type".to_string(),
        settings.build_type.as_str().to_string(),
    );
    axes.insert(
        "compiler".to_string(),
        settings.compiler.family.name().to_string(),
    );
    axes.insert(
        "compiler.version".to_string(),
        settings.compiler.version.as_str().to_string(),
    );
    if let Some(cppstd) = &settings.cppstd {
        axes.insert("cppstd".to_string(), cppstd.clone());
    }
    if let Some(libcxx) = &settings.libcxx {
        axes.insert("libcxx".to_string(), libcxx.clone());
    }
    for (option, value) in config.options() {
        axes.insert(format!("options.{}", option), value.render());
    }

    for axis in irrelevant {
        axes.remove(axis);
        axes.remove(&format!("options.{}", axis));
    }

    for (key, value) in &axes {
        payload.push_str(key);
        payload.push('=');
        payload.push_str(value);
        payload.push('\n');
    }

    Fingerprint::from_payload(&payload)
}
