// src/index.rs

//! Fingerprint-keyed artifact store
//!
//! Stores one published descriptor and file tree per fingerprint, sharded by
//! the first two digest characters. Publication is atomic: everything is
//! staged next to the live slots and renamed into place in one step, so a
//! failed or aborted build never leaves a partial artifact visible. Writers
//! hold an exclusive per-fingerprint lock, so at most one build runs per
//! slot; a requester that blocked on the lock finds the winner's artifact
//! once the lock frees.

use crate::descriptor::ArtifactDescriptor;
use crate::error::{Error, Result};
use crate::fingerprint::Fingerprint;
use fs2::FileExt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

const DESCRIPTOR_FILE: &str = "descriptor.json";

/// A directory-backed package index
#[derive(Debug)]
pub struct PackageIndex {
    root: PathBuf,
}

impl PackageIndex {
    /// Open (or initialize) an index rooted at `root`
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(root.join("locks"))?;
        fs::create_dir_all(root.join("staging"))?;
        Ok(Self { root })
    }

    /// The live slot for a fingerprint, sharded by its first two characters
    fn slot_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        let key = fingerprint.as_str();
        self.root.join(&key[..2]).join(key)
    }

    /// Where a published artifact's file tree lives
    pub fn files_dir(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.slot_dir(fingerprint).join("files")
    }

    /// Whether an artifact is published under this fingerprint
    pub fn has(&self, fingerprint: &Fingerprint) -> bool {
        self.slot_dir(fingerprint).join(DESCRIPTOR_FILE).is_file()
    }

    /// Load the published descriptor, if any
    pub fn get(&self, fingerprint: &Fingerprint) -> Result<Option<ArtifactDescriptor>> {
        let path = self.slot_dir(fingerprint).join(DESCRIPTOR_FILE);
        if !path.is_file() {
            debug!("Index miss: {}", fingerprint.short());
            return Ok(None);
        }
        let text = fs::read_to_string(&path)?;
        let descriptor = serde_json::from_str(&text).map_err(|e| {
            Error::ParseError(format!(
                "corrupt descriptor for {}: {}",
                fingerprint.short(),
                e
            ))
        })?;
        debug!("Index hit: {}", fingerprint.short());
        Ok(Some(descriptor))
    }

    /// Acquire the per-fingerprint build lock
    ///
    /// Blocks while another build for the same fingerprint is in flight.
    /// Callers must re-check [`get`](Self::get) after acquiring: the winner
    /// may have published while this request waited.
    pub fn lock(&self, fingerprint: &Fingerprint) -> Result<BuildSlot<'_>> {
        let lock_path = self
            .root
            .join("locks")
            .join(format!("{}.lock", fingerprint.as_str()));
        let lock_file = File::create(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            info!(
                "Build in progress for {}, waiting on its result",
                fingerprint.short()
            );
            lock_file
                .lock_exclusive()
                .map_err(|e| Error::IoError(format!("failed to acquire build lock: {}", e)))?;
        }

        Ok(BuildSlot {
            index: self,
            fingerprint: fingerprint.clone(),
            _lock: lock_file,
        })
    }

    /// Store an artifact under a fingerprint, taking the build lock
    pub fn put(
        &self,
        fingerprint: &Fingerprint,
        descriptor: &ArtifactDescriptor,
        install_root: &Path,
    ) -> Result<()> {
        let slot = self.lock(fingerprint)?;
        slot.publish(descriptor, install_root)
    }
}

/// Exclusive permission to build and publish one fingerprint
///
/// The advisory lock is released when the slot is dropped, whether or not
/// anything was published.
pub struct BuildSlot<'a> {
    index: &'a PackageIndex,
    fingerprint: Fingerprint,
    _lock: File,
}

impl BuildSlot<'_> {
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Publish atomically: stage the tree and descriptor, then rename the
    /// stage directory into the live slot in one step
    pub fn publish(&self, descriptor: &ArtifactDescriptor, install_root: &Path) -> Result<()> {
        let stage = self
            .index
            .root
            .join("staging")
            .join(self.fingerprint.as_str());
        if stage.exists() {
            // leftover from a crashed run; the lock makes this ours
            fs::remove_dir_all(&stage)?;
        }

        copy_tree(install_root, &stage.join("files"))?;
        let json = serde_json::to_string_pretty(descriptor)
            .map_err(|e| Error::ParseError(format!("descriptor serialization failed: {}", e)))?;
        fs::write(stage.join(DESCRIPTOR_FILE), json)?;

        let slot = self.index.slot_dir(&self.fingerprint);
        if let Some(parent) = slot.parent() {
            fs::create_dir_all(parent)?;
        }
        if slot.exists() {
            // a slot is only ever superseded whole, never edited in place
            fs::remove_dir_all(&slot)?;
        }
        fs::rename(&stage, &slot)?;

        info!(
            "Published {} {} as {}",
            descriptor.name,
            descriptor.version,
            self.fingerprint.short()
        );
        Ok(())
    }
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest)?;
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|e| Error::IoError(e.to_string()))?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| Error::IoError(e.to_string()))?;
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else if entry.path_is_symlink() {
            crate::package::replicate_symlink(entry.path(), &target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
