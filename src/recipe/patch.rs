// src/recipe/patch.rs

//! Ordered patch application for a recipe version
//!
//! Patch lists are declared per exact version and applied in declaration
//! order, the same on every platform, so source trees stay reproducible.
//! Each patch is a unified diff against a single file; the first patch that
//! does not apply cleanly aborts the pipeline before the builder runs.

use crate::error::{Error, Result};
use crate::recipe::format::PatchInfo;
use diffy::Patch;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Apply every declared patch to the working tree, in order
pub fn apply_all(source_dir: &Path, patch_dir: &Path, patches: &[PatchInfo]) -> Result<()> {
    for info in patches {
        info!("Applying patch: {}", info.file);
        apply_one(source_dir, patch_dir, info)?;
    }
    Ok(())
}

fn apply_one(source_dir: &Path, patch_dir: &Path, info: &PatchInfo) -> Result<()> {
    let patch_path = patch_dir.join(&info.file);
    let text = fs::read_to_string(&patch_path).map_err(|e| Error::PatchFailed {
        patch: info.file.clone(),
        reason: format!("cannot read {}: {}", patch_path.display(), e),
    })?;

    let patch = Patch::from_str(&text).map_err(|e| Error::PatchFailed {
        patch: info.file.clone(),
        reason: format!("malformed unified diff: {}", e),
    })?;

    let target = target_path(&patch, info)?;
    let file_path = source_dir.join(&target);
    let original = fs::read_to_string(&file_path).map_err(|e| Error::PatchFailed {
        patch: info.file.clone(),
        reason: format!("target '{}' unreadable: {}", target.display(), e),
    })?;

    let patched = diffy::apply(&original, &patch).map_err(|e| Error::PatchFailed {
        patch: info.file.clone(),
        reason: e.to_string(),
    })?;

    fs::write(&file_path, patched)?;
    debug!("Patched {}", target.display());
    Ok(())
}

/// Resolve the file a patch modifies, honoring the declared strip level
fn target_path(patch: &Patch<'_, str>, info: &PatchInfo) -> Result<PathBuf> {
    let header = patch
        .modified()
        .or_else(|| patch.original())
        .ok_or_else(|| Error::PatchFailed {
            patch: info.file.clone(),
            reason: "diff names no target file".to_string(),
        })?;

    let components: Vec<&str> = header.split('/').collect();
    if components.len() <= info.strip as usize {
        return Err(Error::PatchFailed {
            patch: info.file.clone(),
            reason: format!(
                "cannot strip {} components from '{}'",
                info.strip, header
            ),
        });
    }

    Ok(components[info.strip as usize..].iter().copied().collect())
}
