// tests/common/mod.rs

//! Shared fakes for pipeline integration tests
//!
//! The fetcher lays out an in-memory source tree; the builder records the
//! configure flags it was given and fakes an install tree on demand. Both
//! stand in for the external collaborators the pipeline consumes.

use mortar::recipe::SourceSpec;
use mortar::{Builder, Fetcher, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A fetcher that materializes a fixed set of files as the source tree
pub struct TreeFetcher {
    files: Vec<(String, Vec<u8>)>,
}

impl TreeFetcher {
    pub fn new(files: Vec<(String, Vec<u8>)>) -> Self {
        Self { files }
    }

    /// A plausible library source tree with a license file
    pub fn with_license() -> Self {
        Self::new(vec![
            ("COPYING".to_string(), b"license text".to_vec()),
            ("configure.ac".to_string(), b"AC_INIT\n".to_vec()),
        ])
    }
}

impl Fetcher for TreeFetcher {
    fn fetch(&self, _source: &SourceSpec, dest: &Path) -> Result<PathBuf> {
        let root = dest.join("source");
        for (rel, content) in &self.files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
        }
        Ok(root)
    }
}

/// A builder that records its flags and writes a scripted install tree
pub struct ScriptedBuilder {
    outputs: Vec<(String, Vec<u8>)>,
    /// Flags received at configure time
    pub flags: Vec<String>,
    /// Source file captured at configure time, for patch assertions
    pub captured: Option<String>,
    capture_file: Option<String>,
    builds: Arc<AtomicUsize>,
    delay: Duration,
}

impl ScriptedBuilder {
    pub fn new(outputs: Vec<(String, Vec<u8>)>) -> Self {
        Self {
            outputs,
            flags: Vec::new(),
            captured: None,
            capture_file: None,
            builds: Arc::new(AtomicUsize::new(0)),
            delay: Duration::ZERO,
        }
    }

    /// Record the content of a source-relative file when configure runs
    pub fn capturing(mut self, file: &str) -> Self {
        self.capture_file = Some(file.to_string());
        self
    }

    /// Count build invocations on a shared counter
    pub fn counting(mut self, counter: Arc<AtomicUsize>) -> Self {
        self.builds = counter;
        self
    }

    /// Stretch the build phase to widen concurrency windows
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl Builder for ScriptedBuilder {
    fn configure(&mut self, source_dir: &Path, flags: &[String]) -> Result<()> {
        self.flags = flags.to_vec();
        if let Some(file) = &self.capture_file {
            self.captured = Some(fs::read_to_string(source_dir.join(file))?);
        }
        Ok(())
    }

    fn build(&mut self) -> Result<()> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(())
    }

    fn install(&mut self, dest: &Path) -> Result<()> {
        for (rel, content) in &self.outputs {
            let path = dest.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, content)?;
        }
        Ok(())
    }
}

/// The install tree a successful native build would leave behind
pub fn library_outputs() -> Vec<(String, Vec<u8>)> {
    vec![
        ("lib/libelf.a".to_string(), b"!<arch>\nelf".to_vec()),
        ("lib/libelf.so.1".to_string(), b"\x7fELF elf".to_vec()),
        ("lib/libdw.a".to_string(), b"!<arch>\ndw".to_vec()),
        ("lib/libdw.so.1".to_string(), b"\x7fELF dw".to_vec()),
        (
            "include/libtrace/trace.h".to_string(),
            b"#pragma once\n".to_vec(),
        ),
        (
            "bin/readtrace".to_string(),
            vec![0x7f, b'E', b'L', b'F', 0x02, 0x01],
        ),
        (
            "bin/trace-report".to_string(),
            b"#!/bin/sh\nexec readtrace --report \"$@\"\n".to_vec(),
        ),
        ("etc/trace.conf".to_string(), b"verbose=0\n".to_vec()),
        ("share/man/readtrace.1".to_string(), b".TH readtrace\n".to_vec()),
    ]
}
