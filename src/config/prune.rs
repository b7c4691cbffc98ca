// src/config/prune.rs

//! Conditional option pruning
//!
//! Removes options that do not apply to the active platform, recipe version,
//! or other resolved option values. Platform and version rules run strictly
//! before option-value rules, so a rule like "drop the PIC flag when shared
//! linking is requested" sees the already-resolved shared/static choice.
//! Pruning is pure and idempotent; a removed axis never reappears downstream.

use crate::config::{BuildConfig, OptionValue};
use crate::error::Result;
use crate::version::Version;
use serde::Deserialize;
use std::cmp::Ordering;
use tracing::debug;

/// When a prune rule fires
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PruneCondition {
    /// The target operating system matches (case-insensitive name)
    Os { os: String },
    /// The recipe version is below the given gate (the option did not
    /// exist yet at that version)
    BelowVersion { below_version: String },
    /// Another option holds a specific value
    OptionEquals { option: String, equals: OptionValue },
}

impl PruneCondition {
    /// Platform and version conditions belong to the first pruning pass
    fn is_platform(&self) -> bool {
        !matches!(self, Self::OptionEquals { .. })
    }

    fn holds(&self, config: &BuildConfig, recipe_version: &Version) -> Result<bool> {
        match self {
            Self::Os { os } => Ok(config.settings.os.as_str().eq_ignore_ascii_case(os)),
            Self::BelowVersion { below_version } => {
                let gate = Version::parse(below_version)?;
                Ok(recipe_version.compare(&gate) == Ordering::Less)
            }
            Self::OptionEquals { option, equals } => Ok(config.option(option) == Some(equals)),
        }
    }
}

/// A declared rule removing one option under a condition
#[derive(Debug, Clone, Deserialize)]
pub struct PruneRule {
    pub option: String,
    pub when: PruneCondition,
}

/// Apply conditional pruning and return the canonical model
///
/// Pure: the input model is unchanged. Two passes, in order: platform and
/// version applicability first, then option-value rules against the
/// survivors of the first pass.
pub fn prune(
    config: &BuildConfig,
    rules: &[PruneRule],
    recipe_version: &Version,
) -> Result<BuildConfig> {
    let mut pruned = config.clone();

    for rule in rules.iter().filter(|r| r.when.is_platform()) {
        if rule.when.holds(&pruned, recipe_version)? {
            debug!("Pruning option '{}' (platform rule)", rule.option);
            pruned.remove_option(&rule.option);
        }
    }

    for rule in rules.iter().filter(|r| !r.when.is_platform()) {
        if rule.when.holds(&pruned, recipe_version)? {
            debug!("Pruning option '{}' (option-value rule)", rule.option);
            pruned.remove_option(&rule.option);
        }
    }

    Ok(pruned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Arch, BuildType, Compiler, CompilerFamily, OptionDecl, Os, Settings,
    };
    use std::collections::BTreeMap;

    fn settings(os: Os) -> Settings {
        Settings {
            os,
            arch: Arch::X86_64,
            compiler: Compiler::new(CompilerFamily::Gcc, Version::parse("9").unwrap()),
            build_type: BuildType::Release,
            cppstd: None,
            libcxx: None,
        }
    }

    fn decls() -> Vec<OptionDecl> {
        vec![
            OptionDecl {
                name: "shared".to_string(),
                choices: vec![],
                default: OptionValue::Bool(false),
            },
            OptionDecl {
                name: "fPIC".to_string(),
                choices: vec![],
                default: OptionValue::Bool(true),
            },
            OptionDecl {
                name: "libdebuginfod".to_string(),
                choices: vec![],
                default: OptionValue::Bool(false),
            },
        ]
    }

    fn rules() -> Vec<PruneRule> {
        vec![
            PruneRule {
                option: "fPIC".to_string(),
                when: PruneCondition::Os {
                    os: "windows".to_string(),
                },
            },
            PruneRule {
                option: "libdebuginfod".to_string(),
                when: PruneCondition::BelowVersion {
                    below_version: "0.186".to_string(),
                },
            },
            PruneRule {
                option: "fPIC".to_string(),
                when: PruneCondition::OptionEquals {
                    option: "shared".to_string(),
                    equals: OptionValue::Bool(true),
                },
            },
        ]
    }

    fn resolve(os: Os, shared: bool) -> BuildConfig {
        let mut overrides = BTreeMap::new();
        overrides.insert("shared".to_string(), OptionValue::Bool(shared));
        BuildConfig::resolve(&decls(), settings(os), &overrides).unwrap()
    }

    #[test]
    fn test_prune_by_platform() {
        let version = Version::parse("0.186").unwrap();
        let pruned = prune(&resolve(Os::Windows, false), &rules(), &version).unwrap();
        assert!(pruned.option("fPIC").is_none());
        assert!(pruned.is_removed("fPIC"));
        // unrelated options survive
        assert_eq!(pruned.bool_option("shared"), Some(false));
    }

    #[test]
    fn test_prune_by_version_gate() {
        let old = Version::parse("0.185").unwrap();
        let pruned = prune(&resolve(Os::Linux, false), &rules(), &old).unwrap();
        assert!(pruned.option("libdebuginfod").is_none());

        let new = Version::parse("0.186").unwrap();
        let kept = prune(&resolve(Os::Linux, false), &rules(), &new).unwrap();
        assert_eq!(kept.bool_option("libdebuginfod"), Some(false));
    }

    #[test]
    fn test_prune_by_option_value_sees_resolved_choice() {
        let version = Version::parse("0.186").unwrap();
        let shared = prune(&resolve(Os::Linux, true), &rules(), &version).unwrap();
        assert!(shared.option("fPIC").is_none());

        let static_build = prune(&resolve(Os::Linux, false), &rules(), &version).unwrap();
        assert_eq!(static_build.bool_option("fPIC"), Some(true));
    }

    #[test]
    fn test_prune_is_idempotent() {
        let version = Version::parse("0.185").unwrap();
        let once = prune(&resolve(Os::Windows, true), &rules(), &version).unwrap();
        let twice = prune(&once, &rules(), &version).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prune_leaves_input_unchanged() {
        let version = Version::parse("0.186").unwrap();
        let original = resolve(Os::Windows, false);
        let _ = prune(&original, &rules(), &version).unwrap();
        assert_eq!(original.bool_option("fPIC"), Some(true));
    }
}
