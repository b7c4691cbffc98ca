// src/recipe/mod.rs

//! Recipe system for packaging third-party libraries
//!
//! A recipe is a declarative TOML record: how to obtain one version of an
//! external library, which options it exposes, what it is compatible with,
//! what it pulls in, and what it exports. The modules here cover:
//! - The declaration format itself
//! - Requirement planning from a resolved configuration
//! - Ordered patch application per recipe version

pub mod format;
pub mod patch;
pub mod planner;

pub use format::{
    ComponentTemplate, ConditionalEdge, PatchInfo, RecipeSpec, RequirementDecl, SourceSpec,
    VersionEntry,
};
pub use planner::{PackageCatalog, Requirement, plan};
