// src/package/mod.rs

//! Install-tree packaging
//!
//! Takes a completed build output and produces the canonical install layout:
//! license texts under `licenses/`, artifacts under `bin/`, `lib/`,
//! `include/`, directories the recipe does not ship removed, artifacts that
//! contradict the requested link mode deleted, and executable permissions
//! normalized from file content. Packaging mutates permissions only, never
//! file content.

mod exec;

pub use exec::{MAGIC_LEN, is_executable_payload};

use crate::config::BuildConfig;
use crate::error::{Error, Result};
use crate::recipe::format::PackagingSection;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Packages one build's output into the canonical install layout
pub struct PackagingEngine<'a> {
    spec: &'a PackagingSection,
    config: &'a BuildConfig,
}

impl<'a> PackagingEngine<'a> {
    pub fn new(spec: &'a PackagingSection, config: &'a BuildConfig) -> Self {
        Self { spec, config }
    }

    /// Populate `install_root` from the source tree and the build output
    pub fn package(
        &self,
        source_dir: &Path,
        build_output: &Path,
        install_root: &Path,
    ) -> Result<()> {
        fs::create_dir_all(install_root)?;

        self.copy_licenses(source_dir, install_root)?;
        self.copy_tree(build_output, install_root)?;
        self.remove_declared_dirs(install_root)?;
        self.enforce_link_mode(install_root)?;
        self.check_expected_libraries(install_root)?;
        self.normalize_permissions(install_root)?;

        Ok(())
    }

    /// Copy license texts from the source-tree root to `licenses/`
    fn copy_licenses(&self, source_dir: &Path, install_root: &Path) -> Result<()> {
        let mut patterns = Vec::new();
        for pattern in &self.spec.license_patterns {
            let compiled = glob::Pattern::new(pattern).map_err(|e| {
                Error::ParseError(format!("bad license pattern '{}': {}", pattern, e))
            })?;
            patterns.push(compiled);
        }

        let license_dir = install_root.join("licenses");
        let mut copied = 0usize;

        for entry in fs::read_dir(source_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if patterns.iter().any(|p| p.matches(&name)) {
                fs::create_dir_all(&license_dir)?;
                fs::copy(entry.path(), license_dir.join(name.as_ref()))?;
                copied += 1;
            }
        }

        if copied == 0 {
            warn!("No license files matched in {}", source_dir.display());
        } else {
            debug!("Copied {} license file(s)", copied);
        }
        Ok(())
    }

    /// Copy the build output into the install root
    ///
    /// Symbolic links are recreated when the target platform supports them
    /// and replaced by their target's content when it does not.
    fn copy_tree(&self, build_output: &Path, install_root: &Path) -> Result<()> {
        let caps = self.config.capabilities();

        for entry in WalkDir::new(build_output).min_depth(1) {
            let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
            let rel = entry
                .path()
                .strip_prefix(build_output)
                .map_err(|e| Error::IoError(e.to_string()))?;
            let dest = install_root.join(rel);

            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest)?;
            } else if entry.path_is_symlink() {
                if caps.symlinks {
                    replicate_symlink(entry.path(), &dest)?;
                } else {
                    // the platform cannot express the link; ship the content
                    fs::copy(entry.path(), &dest)?;
                    info!(
                        "Replaced symlink '{}' with its target content",
                        rel.display()
                    );
                }
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &dest)?;
            }
        }
        Ok(())
    }

    /// Remove install-relative directories the recipe does not ship
    fn remove_declared_dirs(&self, install_root: &Path) -> Result<()> {
        for dir in &self.spec.remove_dirs {
            let path = install_root.join(dir);
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
                debug!("Removed {}", dir);
            }
        }
        Ok(())
    }

    /// Delete artifacts inconsistent with the resolved link mode
    ///
    /// When shared linking is selected, static archives for the package's
    /// libraries must not remain installed, and vice versa. Only files
    /// directly inside `lib`/`lib64` directories are considered.
    fn enforce_link_mode(&self, install_root: &Path) -> Result<()> {
        let Some(shared) = self.config.bool_option("shared") else {
            return Ok(());
        };

        let mut doomed: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(install_root) {
            let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
            if !entry.file_type().is_file() && !entry.path_is_symlink() {
                continue;
            }
            if !in_library_dir(entry.path()) {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            let inconsistent = if shared {
                is_static_archive(&name)
            } else {
                is_shared_object(&name)
            };
            if inconsistent {
                doomed.push(entry.path().to_path_buf());
            }
        }

        for path in doomed {
            fs::remove_file(&path)?;
            debug!(
                "Removed {} ({} build)",
                path.display(),
                if shared { "shared" } else { "static" }
            );
        }
        Ok(())
    }

    /// Every declared logical library must survive packaging
    fn check_expected_libraries(&self, install_root: &Path) -> Result<()> {
        for logical in &self.spec.libraries {
            let mut found = false;
            for entry in WalkDir::new(install_root) {
                let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
                if !entry.file_type().is_file() && !entry.path_is_symlink() {
                    continue;
                }
                if in_library_dir(entry.path())
                    && matches_library(&entry.file_name().to_string_lossy(), logical)
                {
                    found = true;
                    break;
                }
            }
            if !found {
                return Err(Error::PackagingInconsistency(format!(
                    "expected library '{}' missing from the install tree",
                    logical
                )));
            }
        }
        Ok(())
    }

    /// Mark scripts and native binaries executable, judged by content
    ///
    /// Skipped entirely on platforms with no executable-bit concept.
    fn normalize_permissions(&self, install_root: &Path) -> Result<()> {
        if !self.config.capabilities().executable_bit {
            debug!("Skipping permission normalization (no executable bit)");
            return Ok(());
        }

        for entry in WalkDir::new(install_root) {
            let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let mut prefix = Vec::with_capacity(MAGIC_LEN);
            fs::File::open(entry.path())?
                .take(MAGIC_LEN as u64)
                .read_to_end(&mut prefix)?;

            if is_executable_payload(&prefix) {
                make_executable(entry.path())?;
                debug!("Marked '{}' executable", entry.path().display());
            }
        }
        Ok(())
    }
}

fn in_library_dir(path: &Path) -> bool {
    matches!(
        path.parent()
            .and_then(|p| p.file_name())
            .and_then(|n| n.to_str()),
        Some("lib") | Some("lib64")
    )
}

fn is_static_archive(name: &str) -> bool {
    name.ends_with(".a")
}

fn is_shared_object(name: &str) -> bool {
    name.contains(".so") || name.ends_with(".dylib") || name.ends_with(".dll")
}

/// Whether an installed file name provides the given logical library
fn matches_library(file: &str, logical: &str) -> bool {
    file.starts_with(&format!("lib{}.", logical))
        || file == format!("{}.lib", logical)
        || file == format!("{}.dll", logical)
}

#[cfg(unix)]
pub(crate) fn replicate_symlink(original: &Path, link: &Path) -> Result<()> {
    let target = fs::read_link(original)?;
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    if link.exists() || link.is_symlink() {
        fs::remove_file(link)?;
    }
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn replicate_symlink(original: &Path, link: &Path) -> Result<()> {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(original, link)?;
    Ok(())
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}
