pub mod local;
pub mod memory;

use std::path::{Path, PathBuf};

pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Kind of a remote directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Folder,
}

/// One entry returned by a remote listing.
#[derive(Debug, Clone)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Content identity of a remote file: SHA-256 hex digest plus size in bytes.
#[derive(Debug, Clone)]
pub struct FileDetails {
    pub sha256: String,
    pub size: u64,
}

/// Errors surfaced by a storage client.
///
/// `Collision` is its own variant so the orchestrator can tell "this name
/// is taken" apart from every other upload failure.
#[derive(Debug)]
pub enum StorageError {
    /// The destination already holds a file under the attempted name.
    Collision(String),
    /// The remote path does not exist.
    NotFound(String),
    Io(std::io::Error),
    Other(String),
}

impl StorageError {
    pub fn is_collision(&self) -> bool {
        matches!(self, StorageError::Collision(_))
    }
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Collision(path) => write!(f, "File already exists: {}", path),
            StorageError::NotFound(path) => write!(f, "Not found: {}", path),
            StorageError::Io(err) => write!(f, "I/O error: {}", err),
            StorageError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err)
    }
}

/// Abstract storage drive holding the origin and destination trees.
///
/// Remote paths are `/`-separated and interpreted relative to the client's
/// root. `upload` must fail with `StorageError::Collision` when the target
/// name is already taken; that failure is the race-free arbiter of who gets
/// a name first.
pub trait StorageClient {
    /// List the direct children of a remote folder.
    fn list_files(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError>;

    /// Fetch a remote file into `local_dir`, returning the local path.
    fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, StorageError>;

    /// Store a local file under its own filename inside `remote_dir`,
    /// creating intermediate folders. Never overwrites.
    fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), StorageError>;

    /// Content identity of a remote file.
    fn file_details(&self, remote_path: &str) -> Result<FileDetails, StorageError>;

    /// Delete a remote file, or a remote folder if it is empty.
    fn delete(&self, remote_path: &str) -> Result<(), StorageError>;
}

/// Join two remote path segments, normalizing separator runs.
pub fn join_remote(base: &str, name: &str) -> String {
    let base = base.trim_end_matches('/');
    let name = name.trim_start_matches('/');
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Final component of a remote path.
pub fn remote_basename(path: &str) -> &str {
    path.trim_end_matches('/').rsplit('/').next().unwrap_or(path)
}
