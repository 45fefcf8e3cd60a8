//! Registry operations bound to a context file on disk.
//!
//! [`ContextFile`] reads the whole file, runs the matching stream operation
//! from [`crate::registry`] and replaces the file with the result. The new
//! content is written to a temporary file in the same directory which is
//! then renamed over the old one, so a reader never observes a partially
//! written registry.
//!
//! A missing file reads as an empty registry. Two processes updating the
//! same file concurrently still race; the last rename wins.

use std::collections::BTreeSet;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::document::empty_registry;
use crate::error::RegistryError;
use crate::presentation::RecentPresentation;
use crate::registry;

/// A context file holding the recent presentations registry.
#[derive(Debug, Clone)]
pub struct ContextFile {
    path: PathBuf,
}

impl ContextFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every valid presentation stored in the file, in path order.
    pub fn read_all(&self) -> Result<BTreeSet<RecentPresentation>, RegistryError> {
        registry::read_all(self.contents()?.as_slice())
    }

    /// Whether `presentation` is registered in the file.
    pub fn exists(&self, presentation: &RecentPresentation) -> Result<bool, RegistryError> {
        registry::exists(self.contents()?.as_slice(), presentation)
    }

    /// Append `presentation`. The file is left untouched when it has no opened date.
    pub fn save(&self, presentation: &RecentPresentation) -> Result<(), RegistryError> {
        let input = self.contents()?;
        let mut output = Vec::new();
        registry::save(input.as_slice(), &mut output, presentation)?;
        self.replace(&output)
    }

    /// Refresh the opened date of `presentation`, appending it when missing.
    pub fn update(&self, presentation: &RecentPresentation) -> Result<(), RegistryError> {
        let input = self.contents()?;
        let mut output = Vec::new();
        registry::update(input.as_slice(), &mut output, presentation)?;
        self.replace(&output)
    }

    /// Keep the `keep_count` most recently opened presentations.
    pub fn purge(&self, keep_count: usize) -> Result<BTreeSet<RecentPresentation>, RegistryError> {
        let input = self.contents()?;
        let mut output = Vec::new();
        let kept = registry::purge(input.as_slice(), &mut output, keep_count)?;
        self.replace(&output)?;
        Ok(kept)
    }

    /// Overwrite the file with an empty registry.
    pub fn reset(&self) -> Result<(), RegistryError> {
        tracing::info!(path = %self.path.display(), "resetting context file");
        self.replace(empty_registry().serialize().as_bytes())
    }

    /// Current file content, empty when the file does not exist.
    fn contents(&self) -> Result<Vec<u8>, RegistryError> {
        match fs::read(&self.path) {
            Ok(contents) => Ok(contents),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "context file not found, using an empty registry");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the file with `contents`.
    ///
    /// Empty `contents` means the operation decided not to write and the
    /// file is kept as is.
    fn replace(&self, contents: &[u8]) -> Result<(), RegistryError> {
        if contents.is_empty() {
            return Ok(());
        }

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(contents)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;

        tracing::debug!(path = %self.path.display(), bytes = contents.len(), "context file written");
        Ok(())
    }
}
