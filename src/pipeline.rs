// src/pipeline.rs

//! The single-recipe build pipeline
//!
//! One build request runs validate → prune → plan → fetch → patch → build →
//! package → publish as a strict sequence. Validation happens before any
//! side effect, the fingerprint is computed before fetching so a published
//! artifact can short-circuit the run, and concurrent requests for the same
//! fingerprint coalesce on the index's per-fingerprint lock. The working
//! tree lives in a temporary directory, so aborting before publication
//! leaves nothing behind.

use crate::config::prune::prune;
use crate::config::validate::validate;
use crate::config::{BuildConfig, OptionValue, Settings};
use crate::descriptor::{self, ArtifactDescriptor};
use crate::error::Result;
use crate::fingerprint::Fingerprint;
use crate::index::PackageIndex;
use crate::package::PackagingEngine;
use crate::recipe::format::{RecipeSpec, SourceSpec};
use crate::recipe::patch;
use crate::recipe::planner::{PackageCatalog, Requirement, plan};
use crate::version::Version;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Materializes a verified source tree (external collaborator)
pub trait Fetcher {
    /// Fetch `source` into a directory under `dest` and return the source
    /// tree root
    ///
    /// Implementations verify the checksum declared for the recipe version
    /// and fail with `Error::Retrieval` or `Error::ChecksumMismatch`.
    fn fetch(&self, source: &SourceSpec, dest: &Path) -> Result<PathBuf>;
}

/// Drives the native build system (external collaborator)
///
/// A non-zero exit status surfaces as `Error::BuildFailed` carrying the
/// builder's own diagnostics verbatim; the pipeline never retries.
pub trait Builder {
    fn configure(&mut self, source_dir: &Path, flags: &[String]) -> Result<()>;
    fn build(&mut self) -> Result<()>;
    fn install(&mut self, dest: &Path) -> Result<()>;
}

/// The result of one build request
#[derive(Debug)]
pub struct BuildOutcome {
    pub fingerprint: Fingerprint,
    pub descriptor: ArtifactDescriptor,
    /// True when a previously published artifact satisfied the request
    pub reused: bool,
    /// Non-fatal validation advisories
    pub advisories: Vec<String>,
    /// Planned upstream requirements, in declaration order
    pub requirements: Vec<Requirement>,
}

/// One recipe wired to an index, a package catalog, and a patch directory
pub struct Pipeline<'a> {
    recipe: &'a RecipeSpec,
    index: &'a PackageIndex,
    catalog: &'a PackageCatalog,
    patch_dir: PathBuf,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        recipe: &'a RecipeSpec,
        index: &'a PackageIndex,
        catalog: &'a PackageCatalog,
        patch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            recipe,
            index,
            catalog,
            patch_dir: patch_dir.into(),
        }
    }

    /// Execute one build request
    pub fn run(
        &self,
        version: &str,
        settings: Settings,
        overrides: &BTreeMap<String, OptionValue>,
        fetcher: &dyn Fetcher,
        builder: &mut dyn Builder,
    ) -> Result<BuildOutcome> {
        let entry = self.recipe.entry(version)?;
        let recipe_version = Version::parse(&entry.version)?;

        // the model is resolved once; every later stage only reads it
        let resolved = BuildConfig::resolve(&self.recipe.options, settings, overrides)?;
        let model = prune(&resolved, &self.recipe.prune, &recipe_version)?;
        let report = validate(&model, &self.recipe.validation, &recipe_version)?;
        let requirements = plan(&self.recipe.requirements, &model, self.catalog)?;

        let fingerprint = self.recipe.fingerprint(version, &model);
        info!(
            "Resolved {} {} as {}",
            self.recipe.package.name,
            version,
            fingerprint.short()
        );

        if let Some(descriptor) = self.index.get(&fingerprint)? {
            info!("Reusing published artifact {}", fingerprint.short());
            return Ok(BuildOutcome {
                fingerprint,
                descriptor,
                reused: true,
                advisories: report.advisories,
                requirements,
            });
        }

        let slot = self.index.lock(&fingerprint)?;
        if let Some(descriptor) = self.index.get(&fingerprint)? {
            // another request published this fingerprint while we waited
            info!("Coalesced onto concurrent build {}", fingerprint.short());
            return Ok(BuildOutcome {
                fingerprint,
                descriptor,
                reused: true,
                advisories: report.advisories,
                requirements,
            });
        }

        let workspace = tempfile::tempdir()?;

        info!("Fetching {}", entry.source.url);
        let source_dir = fetcher.fetch(&entry.source, workspace.path())?;

        patch::apply_all(&source_dir, &self.patch_dir, &entry.patches)?;

        let flags = self.recipe.configure_args(&model);
        info!(
            "Configuring {} with {} flag(s)",
            self.recipe.package.name,
            flags.len()
        );
        builder.configure(&source_dir, &flags)?;
        builder.build()?;

        let build_output = workspace.path().join("destdir");
        fs::create_dir_all(&build_output)?;
        builder.install(&build_output)?;

        info!("Packaging {}", self.recipe.package.name);
        let install_root = workspace.path().join("install");
        PackagingEngine::new(&self.recipe.packaging, &model).package(
            &source_dir,
            &build_output,
            &install_root,
        )?;

        let files_dir = self.index.files_dir(&fingerprint);
        let descriptor =
            descriptor::assemble(self.recipe, &model, version, &fingerprint, &files_dir)?;
        slot.publish(&descriptor, &install_root)?;

        Ok(BuildOutcome {
            fingerprint,
            descriptor,
            reused: false,
            advisories: report.advisories,
            requirements,
        })
    }
}
