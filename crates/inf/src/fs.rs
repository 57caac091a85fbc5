use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub fn create_directory_for_file(p: &Path) -> Result {
    if let Some(parent_dir) = p.parent() {
        std::fs::create_dir_all(parent_dir).map_err(|e| {
            Error::Runtime(format!(
                "Failed to create output directory for file '{}' ({e})",
                p.to_string_lossy()
            ))
        })?;
    }

    Ok(())
}

/// A temporary file that is removed from disk when the value is dropped.
///
/// Ownership of the file is explicit: whoever holds the `TempFile` decides its lifetime,
/// the file disappears on every exit path (success, error or early return) unless it is
/// persisted with [`TempFile::keep`].
#[derive(Debug)]
pub struct TempFile {
    path: tempfile::TempPath,
}

impl TempFile {
    /// Creates an empty temporary file with the given extension (without the leading dot).
    pub fn with_extension(extension: &str) -> Result<Self> {
        Self::create(std::env::temp_dir(), extension)
    }

    /// Creates an empty temporary file in `dir`, so it can be kept on the same file system.
    pub fn in_directory(dir: impl AsRef<Path>, extension: &str) -> Result<Self> {
        std::fs::create_dir_all(dir.as_ref())?;
        Self::create(dir, extension)
    }

    fn create(dir: impl AsRef<Path>, extension: &str) -> Result<Self> {
        let suffix = if extension.is_empty() {
            String::new()
        } else {
            format!(".{extension}")
        };

        let file = tempfile::Builder::new().prefix("rasterwin-").suffix(&suffix).tempfile_in(dir)?;
        let path = file.into_temp_path();
        log::debug!("Created temporary file: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the temporary file to `destination`, after which it is no longer removed on drop.
    pub fn keep(self, destination: impl AsRef<Path>) -> Result<PathBuf> {
        let destination = destination.as_ref();
        create_directory_for_file(destination)?;
        self.path.persist(destination).map_err(|e| Error::IOError(e.error))?;
        Ok(destination.to_path_buf())
    }
}

impl AsRef<Path> for TempFile {
    fn as_ref(&self) -> &Path {
        self.path()
    }
}
