// src/descriptor.rs

//! Exported package metadata for consumers
//!
//! The descriptor is what a downstream project consumes: per-component
//! library names and include paths, requirement edges between components,
//! and environment bindings for packaged tools. It is produced once per
//! successful build, persisted in the package index keyed by fingerprint,
//! and never mutated afterwards.

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use crate::recipe::format::RecipeSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A named subset of the installed artifacts with its own link metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Component {
    /// Library file stems consumers link against
    #[serde(default)]
    pub libs: Vec<String>,

    /// Include search paths, install-relative
    #[serde(default)]
    pub includedirs: Vec<String>,

    /// Requirement edges: a bare name is another component of this package,
    /// "pkg::component" names an external package's component
    #[serde(default)]
    pub requires: Vec<String>,
}

/// The exported metadata for one published artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactDescriptor {
    pub name: String,
    pub version: String,
    pub fingerprint: Fingerprint,

    /// Component graph, acyclic over internal edges
    pub components: BTreeMap<String, Component>,

    /// Install-relative directories holding executables
    #[serde(default)]
    pub bindirs: Vec<String>,

    /// Logical tool name (UPPERCASE) -> absolute installed path
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// Build the descriptor for a resolved model against its install location
///
/// Components and edges gated on options appear only when the option was
/// enabled at build time. Tool bindings resolve to absolute paths under
/// `install_root` with the platform executable suffix applied.
pub fn assemble(
    spec: &RecipeSpec,
    config: &BuildConfig,
    version: &str,
    fingerprint: &Fingerprint,
    install_root: &Path,
) -> Result<ArtifactDescriptor> {
    let mut components = BTreeMap::new();

    for template in &spec.components {
        if let Some(option) = &template.when_option {
            if config.bool_option(option) != Some(true) {
                continue;
            }
        }

        let mut requires = template.requires.clone();
        for edge in &template.conditional_requires {
            if config.bool_option(&edge.when_option) == Some(true) {
                requires.extend(edge.requires.iter().cloned());
            }
        }

        let includedirs = if template.includedirs.is_empty() {
            vec!["include".to_string()]
        } else {
            template.includedirs.clone()
        };

        components.insert(
            template.name.clone(),
            Component {
                libs: template.libs.clone(),
                includedirs,
                requires,
            },
        );
    }

    check_component_graph(&components)?;

    let caps = config.capabilities();
    let mut env = BTreeMap::new();
    for (tool, rel) in &spec.tools {
        let path = install_root.join(format!("{}{}", rel, caps.exe_suffix));
        env.insert(tool.clone(), path.to_string_lossy().into_owned());
    }

    let bindirs = if spec.tools.is_empty() {
        Vec::new()
    } else {
        vec!["bin".to_string()]
    };

    Ok(ArtifactDescriptor {
        name: spec.package.name.clone(),
        version: version.to_string(),
        fingerprint: fingerprint.clone(),
        components,
        bindirs,
        env,
    })
}

/// Internal edges must name declared components and form no cycle
fn check_component_graph(components: &BTreeMap<String, Component>) -> Result<()> {
    for (name, component) in components {
        for req in &component.requires {
            if !req.contains("::") && !components.contains_key(req) {
                return Err(Error::PackagingInconsistency(format!(
                    "component '{}' requires undeclared component '{}'",
                    name, req
                )));
            }
        }
    }

    let mut done: BTreeSet<&str> = BTreeSet::new();
    for name in components.keys() {
        let mut in_progress = BTreeSet::new();
        visit(name, components, &mut done, &mut in_progress)?;
    }
    Ok(())
}

fn visit<'a>(
    name: &'a str,
    components: &'a BTreeMap<String, Component>,
    done: &mut BTreeSet<&'a str>,
    in_progress: &mut BTreeSet<&'a str>,
) -> Result<()> {
    if done.contains(name) {
        return Ok(());
    }
    if !in_progress.insert(name) {
        return Err(Error::PackagingInconsistency(format!(
            "component graph has a cycle involving '{}'",
            name
        )));
    }
    if let Some(component) = components.get(name) {
        for req in &component.requires {
            if !req.contains("::") {
                visit(req, components, done, in_progress)?;
            }
        }
    }
    in_progress.remove(name);
    done.insert(name);
    Ok(())
}
