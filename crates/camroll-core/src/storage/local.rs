use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use super::{EntryKind, FileDetails, RemoteEntry, StorageClient, StorageError};
use crate::conflict;

/// Storage client rooted at a local directory, e.g. a mounted cloud drive.
///
/// Remote paths map to paths under the root; `upload` opens the target with
/// create-new semantics, so an existing file surfaces as a `Collision`
/// without any separate existence check.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, remote_path: &str) -> PathBuf {
        let mut path = self.root.clone();
        for part in remote_path.split('/').filter(|p| !p.is_empty() && *p != ".") {
            path.push(part);
        }
        path
    }
}

impl StorageClient for LocalStorage {
    fn list_files(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
        let dir = self.resolve(path);
        if !dir.exists() {
            return Err(StorageError::NotFound(path.to_string()));
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let kind = if entry.file_type()?.is_dir() {
                EntryKind::Folder
            } else {
                EntryKind::File
            };
            entries.push(RemoteEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                kind,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, StorageError> {
        let source = self.resolve(remote_path);
        if !source.is_file() {
            return Err(StorageError::NotFound(remote_path.to_string()));
        }
        let name = source
            .file_name()
            .ok_or_else(|| StorageError::Other(format!("no filename in path: {}", remote_path)))?;
        let target = local_dir.join(name);
        fs::copy(&source, &target)?;
        Ok(target)
    }

    fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), StorageError> {
        let dir = self.resolve(remote_dir);
        fs::create_dir_all(&dir)?;
        let name = local_file
            .file_name()
            .ok_or_else(|| StorageError::Other(format!("no filename in path: {}", local_file.display())))?;
        let target = dir.join(name);

        let out = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Collision(target.display().to_string()));
            }
            Err(err) => return Err(err.into()),
        };

        let mut reader = File::open(local_file)?;
        let mut writer = BufWriter::new(out);
        io::copy(&mut reader, &mut writer)?;
        Ok(())
    }

    fn file_details(&self, remote_path: &str) -> Result<FileDetails, StorageError> {
        let path = self.resolve(remote_path);
        if !path.is_file() {
            return Err(StorageError::NotFound(remote_path.to_string()));
        }
        let size = fs::metadata(&path)?.len();
        let sha256 = conflict::hash_file(&path)?;
        Ok(FileDetails { sha256, size })
    }

    fn delete(&self, remote_path: &str) -> Result<(), StorageError> {
        let path = self.resolve(remote_path);
        let meta = fs::metadata(&path)
            .map_err(|_| StorageError::NotFound(remote_path.to_string()))?;
        if meta.is_dir() {
            // remove_dir refuses non-empty directories, which is exactly
            // the guarantee the folder cleanup relies on.
            fs::remove_dir(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}
