// src/recipe/planner.rs

//! Requirement planning from the resolved configuration
//!
//! Maps option toggles to upstream package requirements. The output order is
//! the declaration order, so downstream cache keys stay stable across runs.
//! An enabled capability whose package is missing from the catalog fails
//! deterministically instead of silently building without it.

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::recipe::format::RequirementDecl;
use std::collections::BTreeSet;
use std::fmt;

/// A planned upstream requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub package: String,
    pub version: String,
    pub component: Option<String>,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.package, self.version)?;
        if let Some(component) = &self.component {
            write!(f, ":{}", component)?;
        }
        Ok(())
    }
}

/// The set of packages the surrounding index can actually provide
#[derive(Debug, Clone, Default)]
pub struct PackageCatalog {
    names: BTreeSet<String>,
}

impl PackageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a package name, builder style
    pub fn with(mut self, name: impl Into<String>) -> Self {
        self.names.insert(name.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.names.insert(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }
}

/// Derive the ordered requirement list for a resolved model
///
/// A requirement gated on an option is included iff that boolean option is
/// enabled in the model; a gate on a pruned or non-boolean option never
/// includes it.
pub fn plan(
    decls: &[RequirementDecl],
    config: &BuildConfig,
    catalog: &PackageCatalog,
) -> Result<Vec<Requirement>> {
    let mut requirements = Vec::new();

    for decl in decls {
        if let Some(option) = &decl.when_option {
            if config.bool_option(option) != Some(true) {
                continue;
            }
        }
        if !catalog.contains(&decl.package) {
            let reason = match &decl.when_option {
                Some(option) => format!(
                    "required by option '{}' but missing from the package catalog",
                    option
                ),
                None => "missing from the package catalog".to_string(),
            };
            return Err(Error::UnavailableDependency {
                package: decl.package.clone(),
                reason,
            });
        }
        requirements.push(Requirement {
            package: decl.package.clone(),
            version: decl.version.clone(),
            component: decl.component.clone(),
        });
    }

    Ok(requirements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Arch, BuildType, Compiler, CompilerFamily, OptionDecl, OptionValue, Os, Settings,
    };
    use crate::version::Version;
    use std::collections::BTreeMap;

    fn settings() -> Settings {
        Settings {
            os: Os::Linux,
            arch: Arch::X86_64,
            compiler: Compiler::new(CompilerFamily::Gcc, Version::parse("9").unwrap()),
            build_type: BuildType::Release,
            cppstd: None,
            libcxx: None,
        }
    }

    fn decls() -> Vec<RequirementDecl> {
        vec![
            RequirementDecl {
                package: "zlib".to_string(),
                version: "1.2.12".to_string(),
                component: None,
                when_option: None,
            },
            RequirementDecl {
                package: "bzip2".to_string(),
                version: "1.0.8".to_string(),
                component: None,
                when_option: Some("with_bzlib".to_string()),
            },
            RequirementDecl {
                package: "xz".to_string(),
                version: "5.2.5".to_string(),
                component: Some("lzma".to_string()),
                when_option: Some("with_lzma".to_string()),
            },
        ]
    }

    fn config(with_bzlib: bool, with_lzma: bool) -> BuildConfig {
        let options = vec![
            OptionDecl {
                name: "with_bzlib".to_string(),
                choices: vec![],
                default: OptionValue::Bool(with_bzlib),
            },
            OptionDecl {
                name: "with_lzma".to_string(),
                choices: vec![],
                default: OptionValue::Bool(with_lzma),
            },
        ];
        BuildConfig::resolve(&options, settings(), &BTreeMap::new()).unwrap()
    }

    fn full_catalog() -> PackageCatalog {
        PackageCatalog::new().with("zlib").with("bzip2").with("xz")
    }

    #[test]
    fn test_plan_includes_enabled_capabilities() {
        let plan = plan(&decls(), &config(true, true), &full_catalog()).unwrap();
        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].package, "zlib");
        assert_eq!(plan[1].package, "bzip2");
        assert_eq!(plan[2].to_string(), "xz/5.2.5:lzma");
    }

    #[test]
    fn test_plan_excludes_disabled_capabilities() {
        let plan = plan(&decls(), &config(false, false), &full_catalog()).unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].package, "zlib");
    }

    #[test]
    fn test_plan_order_is_declaration_order() {
        let a = plan(&decls(), &config(true, true), &full_catalog()).unwrap();
        let b = plan(&decls(), &config(true, true), &full_catalog()).unwrap();
        assert_eq!(a, b);
        let names: Vec<&str> = a.iter().map(|r| r.package.as_str()).collect();
        assert_eq!(names, vec!["zlib", "bzip2", "xz"]);
    }

    #[test]
    fn test_plan_fails_on_unavailable_enabled_capability() {
        let catalog = PackageCatalog::new().with("zlib").with("xz");
        let err = plan(&decls(), &config(true, false), &catalog).unwrap_err();
        match err {
            Error::UnavailableDependency { package, .. } => assert_eq!(package, "bzip2"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_plan_ignores_unavailable_disabled_capability() {
        let catalog = PackageCatalog::new().with("zlib").with("xz");
        let plan = plan(&decls(), &config(false, true), &catalog).unwrap();
        assert_eq!(plan.len(), 2);
    }
}
