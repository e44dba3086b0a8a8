use log::{debug, error, info, warn};

use crate::cancel::{CancellationToken, CancelledError};
use crate::name::MediaKind;
use crate::relocate::{RelocationOutcome, Relocator};
use crate::storage::{self, EntryKind};

/// Per-run counters, accumulated across an origin tree.
#[derive(Debug, Clone, Default)]
pub struct RelocationReport {
    pub files_relocated: u64,
    pub duplicates_discarded: u64,
    pub files_failed: u64,
    pub files_skipped: u64,
    pub folders_removed: u64,
    pub warnings: Vec<String>,
}

impl RelocationReport {
    pub fn merge(&mut self, other: RelocationReport) {
        self.files_relocated += other.files_relocated;
        self.duplicates_discarded += other.duplicates_discarded;
        self.files_failed += other.files_failed;
        self.files_skipped += other.files_skipped;
        self.folders_removed += other.folders_removed;
        self.warnings.extend(other.warnings);
    }
}

/// Walk an origin folder depth-first, relocating every media file and
/// deleting subfolders that end up empty.
///
/// Per-file and per-subtree errors are isolated: a failed file or an
/// unlistable folder is logged and counted, and the walk continues with
/// its siblings. Only cancellation propagates.
pub fn process_folder(
    relocator: &Relocator,
    path: &str,
    report: &mut RelocationReport,
    cancel: Option<&CancellationToken>,
) -> Result<(), CancelledError> {
    let entries = match relocator.origin().list_files(path) {
        Ok(entries) => entries,
        Err(err) => {
            error!("listing {} failed: {}", path, err);
            report.warnings.push(format!("listing {} failed: {}", path, err));
            return Ok(());
        }
    };

    for entry in entries {
        let entry_path = storage::join_remote(path, &entry.name);
        match entry.kind {
            EntryKind::Folder => {
                info!("processing folder {}", entry_path);
                process_folder(relocator, &entry_path, report, cancel)?;
                remove_if_empty(relocator, &entry_path, report);
            }
            EntryKind::File => {
                if let Some(token) = cancel {
                    token.check()?;
                }
                process_file(relocator, &entry_path, &entry.name, report);
            }
        }
    }

    Ok(())
}

fn process_file(
    relocator: &Relocator,
    entry_path: &str,
    filename: &str,
    report: &mut RelocationReport,
) {
    let Some(kind) = MediaKind::from_filename(filename) else {
        warn!("unknown file type, skipping: {}", entry_path);
        report.files_skipped += 1;
        return;
    };

    match relocator.relocate_file(entry_path, kind) {
        Ok(RelocationOutcome::Relocated { .. }) => report.files_relocated += 1,
        Ok(RelocationOutcome::DuplicateDiscarded { .. }) => report.duplicates_discarded += 1,
        Err(err) => {
            error!("{}: {}; source left in place", entry_path, err);
            report.files_failed += 1;
            report.warnings.push(format!("{}: {}", entry_path, err));
        }
    }
}

/// A processed subfolder should be empty; delete it if the re-listing
/// confirms that.
fn remove_if_empty(relocator: &Relocator, path: &str, report: &mut RelocationReport) {
    match relocator.origin().list_files(path) {
        Ok(remaining) if remaining.is_empty() => match relocator.origin().delete(path) {
            Ok(()) => {
                info!("removed empty folder {}", path);
                report.folders_removed += 1;
            }
            Err(err) => error!("deleting empty folder {} failed: {}", path, err),
        },
        Ok(remaining) => {
            debug!("folder {} not empty ({} items), keeping", path, remaining.len());
        }
        Err(err) => warn!("re-listing {} failed: {}", path, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolderNames;
    use crate::storage::MemoryStorage;

    fn folders() -> FolderNames {
        FolderNames {
            images_folder_name: "images".to_string(),
            screenshot_folder_name: "screenshots".to_string(),
            videos_folder_name: "videos".to_string(),
        }
    }

    #[test]
    fn test_walks_tree_and_cleans_up() {
        let origin = MemoryStorage::new();
        let destination = MemoryStorage::new();
        origin.add_file("roll/2023/20230115_153045123_iOS.jpg", b"a");
        origin.add_file("roll/2023/notes.txt", b"not media");
        origin.add_folder("roll/empty");
        let work = tempfile::tempdir().unwrap();
        let folders = folders();
        let relocator = Relocator::new(&origin, &destination, "backup", &folders, work.path());

        let mut report = RelocationReport::default();
        process_folder(&relocator, "roll", &mut report, None).unwrap();

        assert_eq!(report.files_relocated, 1);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(report.files_failed, 0);
        // Only the empty folder goes away; "2023" still holds notes.txt.
        assert_eq!(report.folders_removed, 1);
        assert!(!origin.folder_exists("roll/empty"));
        assert!(origin.folder_exists("roll/2023"));
        assert!(origin.file("roll/2023/notes.txt").is_some());
    }

    #[test]
    fn test_emptied_folder_is_removed() {
        let origin = MemoryStorage::new();
        let destination = MemoryStorage::new();
        origin.add_file("roll/2023/20230115_153045123_iOS.jpg", b"a");
        let work = tempfile::tempdir().unwrap();
        let folders = folders();
        let relocator = Relocator::new(&origin, &destination, "backup", &folders, work.path());

        let mut report = RelocationReport::default();
        process_folder(&relocator, "roll", &mut report, None).unwrap();

        assert_eq!(report.files_relocated, 1);
        assert_eq!(report.folders_removed, 1);
        assert!(!origin.folder_exists("roll/2023"));
    }

    #[test]
    fn test_listing_failure_is_isolated() {
        let origin = MemoryStorage::new();
        let destination = MemoryStorage::new();
        let work = tempfile::tempdir().unwrap();
        let folders = folders();
        let relocator = Relocator::new(&origin, &destination, "backup", &folders, work.path());

        let mut report = RelocationReport::default();
        process_folder(&relocator, "does-not-exist", &mut report, None).unwrap();
        assert_eq!(report.files_relocated, 0);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_duplicate_and_relocation_both_counted() {
        let origin = MemoryStorage::new();
        let destination = MemoryStorage::new();
        origin.add_file("roll/a.jpg", b"a");
        origin.add_file("roll/b.jpg", b"b");
        // a.jpg is already present at its canonical path, byte-identical.
        destination.add_file("backup/screenshots/0000/00/a.jpg", b"a");
        let work = tempfile::tempdir().unwrap();
        let folders = folders();
        let relocator = Relocator::new(&origin, &destination, "backup", &folders, work.path());

        let mut report = RelocationReport::default();
        process_folder(&relocator, "roll", &mut report, None).unwrap();
        assert_eq!(report.duplicates_discarded, 1);
        assert_eq!(report.files_relocated, 1);
        assert!(origin.file("roll/a.jpg").is_none());
        assert!(origin.file("roll/b.jpg").is_none());
    }

    #[test]
    fn test_cancellation_propagates() {
        let origin = MemoryStorage::new();
        let destination = MemoryStorage::new();
        origin.add_file("roll/a.jpg", b"a");
        let work = tempfile::tempdir().unwrap();
        let folders = folders();
        let relocator = Relocator::new(&origin, &destination, "backup", &folders, work.path());

        let token = CancellationToken::new();
        token.cancel();
        let mut report = RelocationReport::default();
        let result = process_folder(&relocator, "roll", &mut report, Some(&token));
        assert!(result.is_err());
        assert!(origin.file("roll/a.jpg").is_some());
    }
}
