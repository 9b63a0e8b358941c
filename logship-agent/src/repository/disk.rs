//! Disk repository
//!
//! Stores serialized log documents as individual files in a private
//! directory while the remote store is unreachable. One document per file;
//! each file gets a fresh UUID name.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

/// Suffix of files still being written; never listed
const PARTIAL_SUFFIX: &str = ".partial";

/// Repository trait for the local fallback tier
pub trait DiskRepository: Send + Sync {
    /// Writes one document to a new, uniquely named file
    fn write(&self, document: &[u8]) -> Result<PersistedLogFile>;

    /// Lists every persisted document, in no particular order
    fn list(&self) -> Result<Vec<PersistedLogFile>>;

    /// Reads a persisted document back
    fn read(&self, file: &PersistedLogFile) -> Result<Vec<u8>>;

    /// Deletes a persisted document
    fn delete(&self, file: &PersistedLogFile) -> Result<()>;

    /// Whether any persisted documents exist
    ///
    /// A directory that cannot be listed counts as empty.
    fn has_any(&self) -> bool {
        match self.list() {
            Ok(files) => !files.is_empty(),
            Err(e) => {
                warn!("Failed to list persisted logs: {:#}", e);
                false
            }
        }
    }
}

/// Handle to a document persisted on disk
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersistedLogFile {
    path: PathBuf,
}

impl PersistedLogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Filesystem implementation of DiskRepository
#[derive(Debug, Clone)]
pub struct FsDiskRepository {
    dir: PathBuf,
}

impl FsDiskRepository {
    /// Opens the pending-logs directory, creating it if needed
    ///
    /// # Arguments
    /// * `dir` - Directory owned exclusively by this repository
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).with_context(|| {
                format!("Failed to restrict permissions on {}", dir.display())
            })?;
        }

        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn open_private(path: &Path) -> std::io::Result<fs::File> {
        let mut options = OpenOptions::new();
        options.write(true).create_new(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        options.open(path)
    }
}

impl DiskRepository for FsDiskRepository {
    fn write(&self, document: &[u8]) -> Result<PersistedLogFile> {
        let name = format!("{}.json", Uuid::new_v4());
        let path = self.dir.join(&name);
        let partial = self.dir.join(format!("{}{}", name, PARTIAL_SUFFIX));

        let result = Self::open_private(&partial)
            .and_then(|mut file| {
                file.write_all(document)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&partial, &path));

        if let Err(e) = result {
            let _ = fs::remove_file(&partial);
            return Err(e).with_context(|| format!("Failed to write {}", path.display()));
        }

        debug!("Persisted {} bytes to {}", document.len(), path.display());
        Ok(PersistedLogFile::new(path))
    }

    fn list(&self) -> Result<Vec<PersistedLogFile>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to read {}", self.dir.display()))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }
            if path.to_string_lossy().ends_with(PARTIAL_SUFFIX) {
                continue;
            }
            files.push(PersistedLogFile::new(path));
        }

        Ok(files)
    }

    fn read(&self, file: &PersistedLogFile) -> Result<Vec<u8>> {
        fs::read(file.path()).with_context(|| format!("Failed to read {}", file.path().display()))
    }

    fn delete(&self, file: &PersistedLogFile) -> Result<()> {
        fs::remove_file(file.path())
            .with_context(|| format!("Failed to delete {}", file.path().display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_new_creates_directory() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("pending").join("logs");

        let repo = FsDiskRepository::new(&dir).unwrap();
        assert!(repo.dir().is_dir());

        // Idempotent
        FsDiskRepository::new(&dir).unwrap();
    }

    #[test]
    fn test_write_list_read_delete() {
        let temp = TempDir::new().unwrap();
        let repo = FsDiskRepository::new(temp.path()).unwrap();
        assert!(!repo.has_any());

        let first = repo.write(b"first").unwrap();
        let second = repo.write(b"second").unwrap();
        assert_ne!(first, second);

        let mut listed = repo.list().unwrap();
        listed.sort_by_key(|f| f.name());
        let mut expected = vec![first.clone(), second.clone()];
        expected.sort_by_key(|f| f.name());
        assert_eq!(listed, expected);
        assert!(repo.has_any());

        assert_eq!(repo.read(&first).unwrap(), b"first");

        repo.delete(&first).unwrap();
        assert_eq!(repo.list().unwrap(), vec![second]);
    }

    #[test]
    fn test_list_skips_partial_files_and_directories() {
        let temp = TempDir::new().unwrap();
        let repo = FsDiskRepository::new(temp.path()).unwrap();

        fs::write(temp.path().join("abc.json.partial"), b"half").unwrap();
        fs::create_dir(temp.path().join("nested")).unwrap();

        assert!(repo.list().unwrap().is_empty());
        assert!(!repo.has_any());
    }

    #[test]
    fn test_delete_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let repo = FsDiskRepository::new(temp.path()).unwrap();

        let missing = PersistedLogFile::new(temp.path().join("missing.json"));
        assert!(repo.delete(&missing).is_err());
    }

    #[test]
    fn test_list_of_vanished_directory_is_error() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("logs");
        let repo = FsDiskRepository::new(&dir).unwrap();

        fs::remove_dir(&dir).unwrap();
        assert!(repo.list().is_err());
        assert!(!repo.has_any());
        assert!(repo.write(b"doc").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_files_are_private() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let repo = FsDiskRepository::new(temp.path().join("logs")).unwrap();
        let file = repo.write(b"secret").unwrap();

        let mode = fs::metadata(file.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
