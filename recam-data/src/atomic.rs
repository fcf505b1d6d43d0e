//! Atomic output files.
//!
//! Output is staged in a temporary file next to the destination and renamed
//! over it only once fully written. The temporary file is removed on every
//! failure path when the guard drops.

use crate::error::ResampleError;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A staged output file that becomes visible at its destination on [`commit`].
///
/// [`commit`]: StagedFile::commit
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: PathBuf,
}

impl StagedFile {
    /// Create the temporary file in the destination's directory, keeping the
    /// destination's extension so tools that infer formats from it still work.
    pub fn new(destination: impl AsRef<Path>) -> Result<Self, ResampleError> {
        let destination = destination.as_ref().to_path_buf();
        let dir = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let suffix = destination
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();

        let temp = tempfile::Builder::new()
            .prefix(".recam-")
            .suffix(&suffix)
            .tempfile_in(&dir)
            .map_err(|e| ResampleError::io(&destination, e))?;

        debug!(
            "Staging {} at {}",
            destination.display(),
            temp.path().display()
        );
        Ok(Self { temp, destination })
    }

    /// Path of the temporary file, for writers that need a path (e.g. an encoder process).
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write through the open temporary file handle.
    pub fn write_with<F>(&mut self, write: F) -> Result<(), ResampleError>
    where
        F: FnOnce(&mut dyn Write) -> std::io::Result<()>,
    {
        let mut writer = BufWriter::new(self.temp.as_file_mut());
        write(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| ResampleError::io(&self.destination, e))
    }

    /// Flush to disk and rename over the destination.
    pub fn commit(self) -> Result<PathBuf, ResampleError> {
        let Self { temp, destination } = self;
        temp.as_file()
            .sync_all()
            .map_err(|e| ResampleError::io(&destination, e))?;
        temp.persist(&destination)
            .map_err(|e| ResampleError::io(&destination, e.error))?;
        debug!("Committed {}", destination.display());
        Ok(destination)
    }
}

/// Write `bytes` to `destination` atomically.
pub fn write_atomic(destination: impl AsRef<Path>, bytes: &[u8]) -> Result<(), ResampleError> {
    let mut staged = StagedFile::new(destination)?;
    staged.write_with(|w| w.write_all(bytes))?;
    staged.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_write_atomic_replaces_destination() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.json");
        fs::write(&dest, b"old").unwrap();

        write_atomic(&dest, b"new contents").unwrap();

        assert_eq!(fs::read(&dest).unwrap(), b"new contents");
        assert_eq!(dir_entries(dir.path()), vec!["out.json".to_string()]);
    }

    #[test]
    fn test_dropped_stage_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("clip.mp4");
        {
            let mut staged = StagedFile::new(&dest).unwrap();
            assert_eq!(staged.path().extension().unwrap(), "mp4");
            staged.write_with(|w| w.write_all(b"partial")).unwrap();
        }
        assert!(!dest.exists());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("no/such/dir/out.json");
        let err = write_atomic(&dest, b"x").unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Io);
    }
}
