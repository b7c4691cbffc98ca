// src/config/validate.rs

//! Compatibility validation against recipe-declared rules
//!
//! Runs strictly before any fetch or build side effect. Hard failures are
//! `UnsupportedConfiguration`: a deny-listed compiler family, a compiler
//! below the recipe's minimum for the pinned language standard, or a violated
//! cross-option constraint. Unknown compiler families produce a non-fatal
//! advisory, because the recipe catalog cannot enumerate every toolchain.

use crate::config::{BuildConfig, OptionValue};
use crate::error::{Error, Result};
use crate::version::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::warn;

/// A deny-list entry, optionally gated on the recipe version
#[derive(Debug, Clone, Deserialize)]
pub struct DeniedCompiler {
    /// Compiler family name, matched case-insensitively
    pub family: String,
    /// Deny only at or above this recipe version
    #[serde(default)]
    pub since_version: Option<String>,
    /// Deny only below this recipe version
    #[serde(default)]
    pub until_version: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

impl DeniedCompiler {
    fn applies(&self, recipe_version: &Version) -> Result<bool> {
        if let Some(gate) = &self.since_version {
            let gate = Version::parse(gate)?;
            if recipe_version.compare(&gate) == Ordering::Less {
                return Ok(false);
            }
        }
        if let Some(gate) = &self.until_version {
            let gate = Version::parse(gate)?;
            if recipe_version.compare(&gate) != Ordering::Less {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// A cross-option constraint: when `option` holds `equals`, `requires`
/// must hold `to_equal`
#[derive(Debug, Clone, Deserialize)]
pub struct OptionConstraint {
    pub option: String,
    pub equals: OptionValue,
    pub requires: String,
    pub to_equal: OptionValue,
}

/// Recipe-declared validation rules
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ValidationRules {
    /// Compiler families that can never build this recipe
    #[serde(default)]
    pub deny: Vec<DeniedCompiler>,
    /// Per-family minimum compiler versions, consulted only when the
    /// profile pins a language standard
    #[serde(default)]
    pub minimum_compiler: BTreeMap<String, String>,
    /// Cross-option constraints
    #[serde(default)]
    pub constraints: Vec<OptionConstraint>,
}

/// The result of a successful validation
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Non-fatal advisories, already logged, kept for the build outcome
    pub advisories: Vec<String>,
}

/// Validate a resolved model against the recipe's rules
pub fn validate(
    config: &BuildConfig,
    rules: &ValidationRules,
    recipe_version: &Version,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let compiler = &config.settings.compiler;

    // Hard deny-list, regardless of compiler version or option values
    for deny in &rules.deny {
        if !deny.family.eq_ignore_ascii_case(compiler.family.name()) {
            continue;
        }
        if !deny.applies(recipe_version)? {
            continue;
        }
        let reason = deny.reason.clone().unwrap_or_else(|| {
            format!("compiler family '{}' is not supported", compiler.family)
        });
        return Err(Error::UnsupportedConfiguration(reason));
    }

    // Minimum versions only constrain builds that pin a language standard
    if let Some(cppstd) = &config.settings.cppstd {
        let key = compiler.family.name().to_lowercase();
        if let Some(minimum) = rules.minimum_compiler.get(&key) {
            let minimum = Version::parse(minimum)?;
            if compiler.version.compare(&minimum) == Ordering::Less {
                return Err(Error::UnsupportedConfiguration(format!(
                    "{} is below the minimum version {} required for C++{}",
                    compiler, minimum, cppstd
                )));
            }
        } else {
            let note = format!(
                "no minimum-version data for compiler family '{}', assuming C++{} support",
                compiler.family, cppstd
            );
            warn!("{}", note);
            report.advisories.push(note);
        }
    }

    // Unrecognized toolchains proceed with an advisory rather than failing
    if !compiler.family.is_known() {
        let note = format!(
            "unrecognized compiler family '{}', proceeding without compatibility data",
            compiler.family
        );
        warn!("{}", note);
        report.advisories.push(note);
    }

    // Cross-option constraints
    for constraint in &rules.constraints {
        if config.option(&constraint.option) == Some(&constraint.equals)
            && config.option(&constraint.requires) != Some(&constraint.to_equal)
        {
            return Err(Error::UnsupportedConfiguration(format!(
                "option '{}'={} requires '{}'={}",
                constraint.option, constraint.equals, constraint.requires, constraint.to_equal
            )));
        }
    }

    Ok(report)
}
