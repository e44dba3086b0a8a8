pub mod cancel;
pub mod config;
pub mod conflict;
pub mod date;
pub mod metadata;
pub mod name;
pub mod relocate;
pub mod storage;
pub mod traverse;

use std::path::Path;

pub use cancel::{CancellationToken, CancelledError};
pub use config::{Config, FolderNames, OriginProfile};
pub use relocate::{RelocationError, RelocationOutcome, Relocator, MAX_SEQUENCE};
pub use storage::{LocalStorage, MemoryStorage, StorageClient, StorageError};
pub use traverse::RelocationReport;

/// Relocate one origin tree into the destination library.
///
/// Walks `source_path` on the origin drive and moves every media file to
/// `destination_root/{kind folder}/{year}/{month}` on the destination,
/// under its canonical name. Per-file failures are counted in the report;
/// only cancellation aborts the walk.
pub fn relocate_tree(
    origin: &dyn StorageClient,
    destination: &dyn StorageClient,
    source_path: &str,
    destination_root: &str,
    folders: &FolderNames,
    work_dir: &Path,
    cancel: Option<&CancellationToken>,
) -> anyhow::Result<RelocationReport> {
    let relocator = Relocator::new(origin, destination, destination_root, folders, work_dir);
    let mut report = RelocationReport::default();
    traverse::process_folder(&relocator, source_path, &mut report, cancel)?;
    Ok(report)
}
