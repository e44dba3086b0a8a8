use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use sha2::{Digest, Sha256};

use super::{EntryKind, FileDetails, RemoteEntry, StorageClient, StorageError};

/// In-memory storage client: a test double and dry-run target.
///
/// Files live in a path-keyed map; folders are tracked explicitly so that
/// empty ones can still be listed and deleted like on a real drive.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
    folders: Mutex<BTreeSet<String>>,
}

fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a file, registering its parent folders.
    pub fn add_file(&self, path: &str, contents: &[u8]) {
        let path = normalize(path);
        self.register_parents(&path);
        self.files.lock().unwrap().insert(path, contents.to_vec());
    }

    /// Seed an empty folder.
    pub fn add_folder(&self, path: &str) {
        let path = normalize(path);
        self.register_parents(&path);
        self.folders.lock().unwrap().insert(path);
    }

    /// Contents of a stored file, if present.
    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(&normalize(path)).cloned()
    }

    /// All stored file paths, in order.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }

    pub fn folder_exists(&self, path: &str) -> bool {
        self.folders.lock().unwrap().contains(&normalize(path))
    }

    fn register_parents(&self, path: &str) {
        let mut folders = self.folders.lock().unwrap();
        let mut prefix = String::new();
        let parts: Vec<&str> = path.split('/').collect();
        for part in &parts[..parts.len().saturating_sub(1)] {
            if !prefix.is_empty() {
                prefix.push('/');
            }
            prefix.push_str(part);
            folders.insert(prefix.clone());
        }
    }

    fn child_of<'a>(parent: &str, path: &'a str) -> Option<&'a str> {
        let rest = if parent.is_empty() {
            path
        } else {
            path.strip_prefix(parent)?.strip_prefix('/')?
        };
        if rest.is_empty() {
            None
        } else {
            Some(rest.split('/').next().unwrap_or(rest))
        }
    }

    fn folder_known(&self, path: &str) -> bool {
        if path.is_empty() {
            return true;
        }
        self.folders.lock().unwrap().contains(path)
    }
}

impl StorageClient for MemoryStorage {
    fn list_files(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
        let path = normalize(path);
        if !self.folder_known(&path) {
            return Err(StorageError::NotFound(path));
        }
        let mut seen = BTreeSet::new();
        let mut entries = Vec::new();
        for folder in self.folders.lock().unwrap().iter() {
            if let Some(child) = Self::child_of(&path, folder) {
                if seen.insert(child.to_string()) {
                    entries.push(RemoteEntry {
                        name: child.to_string(),
                        kind: EntryKind::Folder,
                    });
                }
            }
        }
        for file in self.files.lock().unwrap().keys() {
            if let Some(child) = Self::child_of(&path, file) {
                let kind = if file == &super::join_remote(&path, child) {
                    EntryKind::File
                } else {
                    EntryKind::Folder
                };
                if seen.insert(child.to_string()) {
                    entries.push(RemoteEntry {
                        name: child.to_string(),
                        kind,
                    });
                }
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, StorageError> {
        let path = normalize(remote_path);
        let contents = self
            .files
            .lock()
            .unwrap()
            .get(&path)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;
        let target = local_dir.join(super::remote_basename(&path));
        fs::write(&target, contents)?;
        Ok(target)
    }

    fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), StorageError> {
        let name = local_file
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| StorageError::Other(format!("no filename in path: {}", local_file.display())))?;
        let key = super::join_remote(&normalize(remote_dir), name);
        let contents = fs::read(local_file)?;

        let mut files = self.files.lock().unwrap();
        if files.contains_key(&key) {
            return Err(StorageError::Collision(key));
        }
        files.insert(key.clone(), contents);
        drop(files);
        self.register_parents(&key);
        Ok(())
    }

    fn file_details(&self, remote_path: &str) -> Result<FileDetails, StorageError> {
        let path = normalize(remote_path);
        let files = self.files.lock().unwrap();
        let contents = files
            .get(&path)
            .ok_or_else(|| StorageError::NotFound(path.clone()))?;
        Ok(FileDetails {
            sha256: hex::encode(Sha256::digest(contents)),
            size: contents.len() as u64,
        })
    }

    fn delete(&self, remote_path: &str) -> Result<(), StorageError> {
        let path = normalize(remote_path);
        if self.files.lock().unwrap().remove(&path).is_some() {
            return Ok(());
        }
        if self.folder_known(&path) {
            let occupied = self
                .files
                .lock()
                .unwrap()
                .keys()
                .any(|k| Self::child_of(&path, k).is_some())
                || self
                    .folders
                    .lock()
                    .unwrap()
                    .iter()
                    .any(|f| Self::child_of(&path, f).is_some());
            if occupied {
                return Err(StorageError::Other(format!("folder not empty: {}", path)));
            }
            self.folders.lock().unwrap().remove(&path);
            return Ok(());
        }
        Err(StorageError::NotFound(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_and_folders() {
        let storage = MemoryStorage::new();
        storage.add_file("roll/2015/a.jpg", b"x");
        storage.add_folder("roll/empty");

        let entries = storage.list_files("roll").unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["2015", "empty"]);

        let leaf = storage.list_files("roll/2015").unwrap();
        assert_eq!(leaf[0].name, "a.jpg");
        assert_eq!(leaf[0].kind, EntryKind::File);
    }

    #[test]
    fn test_upload_collision_and_delete() {
        let storage = MemoryStorage::new();
        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("a.jpg");
        fs::write(&local, b"x").unwrap();

        storage.upload(&local, "dest/2023/01").unwrap();
        assert!(storage.upload(&local, "dest/2023/01").unwrap_err().is_collision());

        assert!(storage.delete("dest/2023").is_err());
        storage.delete("dest/2023/01/a.jpg").unwrap();
        storage.delete("dest/2023/01").unwrap();
    }

    #[test]
    fn test_file_details() {
        let storage = MemoryStorage::new();
        storage.add_file("a.bin", b"hello");
        let details = storage.file_details("a.bin").unwrap();
        assert_eq!(details.size, 5);
        assert_eq!(
            details.sha256,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
        assert!(matches!(
            storage.file_details("missing"),
            Err(StorageError::NotFound(_))
        ));
    }
}
