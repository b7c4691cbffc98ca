// src/lib.rs

//! Mortar: a recipe engine for third-party native libraries
//!
//! One generic pipeline plus a declarative recipe record per package, rather
//! than a bespoke build script per library.
//!
//! # Architecture
//!
//! - Recipes are data: TOML records declaring options, rules, and components
//! - Configuration resolves once into an immutable model per build request
//! - The fingerprint reduces the model to the axes that shape the binary
//! - The package index holds one artifact per fingerprint, published
//!   atomically under a per-fingerprint build lock

pub mod config;
pub mod descriptor;
mod error;
pub mod fingerprint;
pub mod index;
pub mod package;
pub mod pipeline;
pub mod recipe;
pub mod version;

pub use config::prune::{PruneCondition, PruneRule, prune};
pub use config::validate::{
    DeniedCompiler, OptionConstraint, ValidationReport, ValidationRules, validate,
};
pub use config::{
    Arch, BuildConfig, BuildType, Compiler, CompilerFamily, OptionDecl, OptionValue, Os,
    PlatformCaps, Settings,
};
pub use descriptor::{ArtifactDescriptor, Component, assemble};
pub use error::{Error, Result};
pub use fingerprint::{Fingerprint, PackageKind, fingerprint};
pub use index::{BuildSlot, PackageIndex};
pub use package::{PackagingEngine, is_executable_payload};
pub use pipeline::{BuildOutcome, Builder, Fetcher, Pipeline};
pub use recipe::{PackageCatalog, RecipeSpec, Requirement, plan};
pub use version::Version;
