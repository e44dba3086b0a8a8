use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::storage::StorageClient;

/// Hashing reads the file in fixed-size chunks; large media files must
/// never be buffered whole.
const HASH_CHUNK_SIZE: usize = 8192;

/// Verdict on a name collision at the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictOutcome {
    /// Hash and size both match; the source can be discarded.
    Identical,
    /// Either differs; the upload must retry under a disambiguated name.
    Distinct,
    /// Local file missing, I/O error, or remote lookup failure. No
    /// relocation decision can be made for this file.
    ComparisonFailed(String),
}

/// Streaming SHA-256 of a local file, as a lowercase hex digest.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare a local file against the remote file at `remote_path`.
///
/// Identity requires the SHA-256 digests (case-insensitively) and the
/// exact sizes to both match; any mismatch is `Distinct`.
pub fn compare(
    remote: &dyn StorageClient,
    remote_path: &str,
    local_file: &Path,
) -> ConflictOutcome {
    let details = match remote.file_details(remote_path) {
        Ok(details) => details,
        Err(err) => {
            return ConflictOutcome::ComparisonFailed(format!(
                "remote lookup failed for {}: {}",
                remote_path, err
            ));
        }
    };

    let local_size = match std::fs::metadata(local_file) {
        Ok(meta) => meta.len(),
        Err(err) => {
            return ConflictOutcome::ComparisonFailed(format!(
                "local file {}: {}",
                local_file.display(),
                err
            ));
        }
    };
    let local_hash = match hash_file(local_file) {
        Ok(hash) => hash,
        Err(err) => {
            return ConflictOutcome::ComparisonFailed(format!(
                "hashing {}: {}",
                local_file.display(),
                err
            ));
        }
    };

    if local_hash.eq_ignore_ascii_case(&details.sha256) && local_size == details.size {
        ConflictOutcome::Identical
    } else {
        ConflictOutcome::Distinct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileDetails, MemoryStorage, RemoteEntry, StorageError};
    use std::path::PathBuf;

    #[test]
    fn test_identical_regardless_of_name() {
        let storage = MemoryStorage::new();
        storage.add_file("dest/p_20230115_133045_500.jpg", b"same bytes");

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("unrelated-name.jpg");
        std::fs::write(&local, b"same bytes").unwrap();

        assert_eq!(
            compare(&storage, "dest/p_20230115_133045_500.jpg", &local),
            ConflictOutcome::Identical
        );
    }

    #[test]
    fn test_one_byte_difference_is_distinct() {
        let storage = MemoryStorage::new();
        storage.add_file("dest/a.jpg", b"same bytes");

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("a.jpg");
        std::fs::write(&local, b"same bytez").unwrap();

        assert_eq!(
            compare(&storage, "dest/a.jpg", &local),
            ConflictOutcome::Distinct
        );
    }

    /// Some drives report digests uppercase; identity must not care.
    struct UppercaseDigests(MemoryStorage);

    impl StorageClient for UppercaseDigests {
        fn list_files(&self, path: &str) -> Result<Vec<RemoteEntry>, StorageError> {
            self.0.list_files(path)
        }
        fn download(&self, remote_path: &str, local_dir: &Path) -> Result<PathBuf, StorageError> {
            self.0.download(remote_path, local_dir)
        }
        fn upload(&self, local_file: &Path, remote_dir: &str) -> Result<(), StorageError> {
            self.0.upload(local_file, remote_dir)
        }
        fn file_details(&self, remote_path: &str) -> Result<FileDetails, StorageError> {
            let mut details = self.0.file_details(remote_path)?;
            details.sha256 = details.sha256.to_uppercase();
            Ok(details)
        }
        fn delete(&self, remote_path: &str) -> Result<(), StorageError> {
            self.0.delete(remote_path)
        }
    }

    #[test]
    fn test_hash_comparison_is_case_insensitive() {
        let inner = MemoryStorage::new();
        inner.add_file("dest/a.jpg", b"payload");
        let storage = UppercaseDigests(inner);

        let dir = tempfile::tempdir().unwrap();
        let local = dir.path().join("a.jpg");
        std::fs::write(&local, b"payload").unwrap();

        assert_eq!(
            compare(&storage, "dest/a.jpg", &local),
            ConflictOutcome::Identical
        );
    }

    #[test]
    fn test_missing_sides_fail_comparison() {
        let storage = MemoryStorage::new();
        storage.add_file("dest/a.jpg", b"payload");

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.jpg");
        assert!(matches!(
            compare(&storage, "dest/a.jpg", &missing),
            ConflictOutcome::ComparisonFailed(_)
        ));

        let local = dir.path().join("a.jpg");
        std::fs::write(&local, b"payload").unwrap();
        assert!(matches!(
            compare(&storage, "dest/not-there.jpg", &local),
            ConflictOutcome::ComparisonFailed(_)
        ));
    }
}
