use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::FolderNames;
use crate::conflict::{self, ConflictOutcome};
use crate::date::{self, Provenance, ResolvedDate};
use crate::metadata;
use crate::name::{self, MediaKind};
use crate::storage::{self, StorageClient, StorageError};

/// Upper bound on the disambiguation sequence. Exceeding it surfaces as
/// `DisambiguationExhausted` instead of retrying forever.
pub const MAX_SEQUENCE: u32 = 99;

/// Terminal result of relocating one source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelocationOutcome {
    /// Uploaded under its canonical name; the origin copy was deleted.
    Relocated { remote_path: String },
    /// The destination already held byte-identical content; the origin
    /// copy was deleted without re-uploading.
    DuplicateDiscarded { remote_path: String },
}

/// Per-file failure. Never aborts the batch; the origin file stays put.
#[derive(Debug)]
pub enum RelocationError {
    Download(StorageError),
    Upload(StorageError),
    /// The collision comparison could not reach a verdict.
    Comparison(String),
    /// Every sequence up to `MAX_SEQUENCE` collided with distinct content.
    DisambiguationExhausted { attempts: u32 },
    Io(io::Error),
}

impl std::fmt::Display for RelocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelocationError::Download(err) => write!(f, "download failed: {}", err),
            RelocationError::Upload(err) => write!(f, "upload failed: {}", err),
            RelocationError::Comparison(reason) => write!(f, "comparison failed: {}", reason),
            RelocationError::DisambiguationExhausted { attempts } => {
                write!(f, "gave up after {} name attempts", attempts)
            }
            RelocationError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for RelocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelocationError::Download(err) | RelocationError::Upload(err) => Some(err),
            RelocationError::Io(err) => Some(err),
            _ => None,
        }
    }
}

/// Drives one file at a time through resolve -> compose -> upload ->
/// conflict handling, against an origin and a destination client.
pub struct Relocator<'a> {
    origin: &'a dyn StorageClient,
    destination: &'a dyn StorageClient,
    destination_root: String,
    folders: &'a FolderNames,
    work_dir: PathBuf,
}

/// Owns the downloaded copy in local working storage; the file is removed
/// when the guard drops, on every exit path.
struct WorkFile {
    path: PathBuf,
}

impl WorkFile {
    fn path(&self) -> &Path {
        &self.path
    }

    /// Rename the working copy in place to the next candidate name.
    fn rename_to(&mut self, new_name: &str) -> io::Result<()> {
        let target = self.path.with_file_name(new_name);
        if target != self.path {
            fs::rename(&self.path, &target)?;
            self.path = target;
        }
        Ok(())
    }
}

impl Drop for WorkFile {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!("leaking work file {}: {}", self.path.display(), err);
            }
        }
    }
}

impl<'a> Relocator<'a> {
    pub fn new(
        origin: &'a dyn StorageClient,
        destination: &'a dyn StorageClient,
        destination_root: &str,
        folders: &'a FolderNames,
        work_dir: &Path,
    ) -> Self {
        Self {
            origin,
            destination,
            destination_root: destination_root.trim_end_matches('/').to_string(),
            folders,
            work_dir: work_dir.to_path_buf(),
        }
    }

    pub fn origin(&self) -> &dyn StorageClient {
        self.origin
    }

    /// Relocate one source file to its canonical destination path.
    pub fn relocate_file(
        &self,
        source_path: &str,
        kind: MediaKind,
    ) -> Result<RelocationOutcome, RelocationError> {
        self.relocate_with_bound(source_path, kind, MAX_SEQUENCE)
    }

    fn relocate_with_bound(
        &self,
        source_path: &str,
        kind: MediaKind,
        max_sequence: u32,
    ) -> Result<RelocationOutcome, RelocationError> {
        let filename = storage::remote_basename(source_path);
        let downloaded = self
            .origin
            .download(source_path, &self.work_dir)
            .map_err(RelocationError::Download)?;
        let mut work = WorkFile { path: downloaded };

        let meta = metadata::extract(work.path(), kind);
        let resolved = date::resolve(&meta, filename);
        let base_name = name::compose(&resolved, filename, kind);
        let remote_dir = self.destination_dir(&resolved, filename, kind);
        debug!(
            "{}: resolved {:?} -> {}/{}",
            source_path, resolved.provenance, remote_dir, base_name
        );

        for sequence in 0..=max_sequence {
            let candidate = if sequence == 0 {
                base_name.clone()
            } else {
                name::with_sequence(&base_name, sequence)
            };
            work.rename_to(&candidate).map_err(RelocationError::Io)?;

            match self.destination.upload(work.path(), &remote_dir) {
                Ok(()) => {
                    let remote_path = storage::join_remote(&remote_dir, &candidate);
                    info!("relocated {} -> {}", source_path, remote_path);
                    self.delete_origin(source_path);
                    return Ok(RelocationOutcome::Relocated { remote_path });
                }
                Err(err) if err.is_collision() => {
                    let remote_path = storage::join_remote(&remote_dir, &candidate);
                    match conflict::compare(self.destination, &remote_path, work.path()) {
                        ConflictOutcome::Identical => {
                            info!(
                                "{} already present at {}; dropping source",
                                source_path, remote_path
                            );
                            self.delete_origin(source_path);
                            return Ok(RelocationOutcome::DuplicateDiscarded { remote_path });
                        }
                        ConflictOutcome::Distinct => {
                            debug!("distinct content at {}; disambiguating", remote_path);
                        }
                        ConflictOutcome::ComparisonFailed(reason) => {
                            return Err(RelocationError::Comparison(reason));
                        }
                    }
                }
                Err(err) => return Err(RelocationError::Upload(err)),
            }
        }

        Err(RelocationError::DisambiguationExhausted {
            attempts: max_sequence + 1,
        })
    }

    /// Destination folder for a resolved file:
    /// `{root}/{kind folder}/{year|0000}/{month|00}`.
    ///
    /// PNGs and photos whose date did not come from capture metadata land
    /// in the screenshots folder; other photos in the images folder.
    fn destination_dir(&self, resolved: &ResolvedDate, filename: &str, kind: MediaKind) -> String {
        let folder = match kind {
            MediaKind::Video => &self.folders.videos_folder_name,
            MediaKind::Photo => {
                let is_png = name::extension(filename) == "png";
                if is_png || resolved.provenance != Provenance::ExifName {
                    &self.folders.screenshot_folder_name
                } else {
                    &self.folders.images_folder_name
                }
            }
        };
        let year = resolved.year.as_deref().unwrap_or("0000");
        let month = resolved.month.as_deref().unwrap_or("00");
        format!("{}/{}/{}/{}", self.destination_root, folder, year, month)
    }

    /// Called only once the destination holds the content, by fresh upload
    /// or proven identity. A failed delete is retried implicitly on the
    /// next run, where the copy resolves as an identical duplicate.
    fn delete_origin(&self, source_path: &str) {
        if let Err(err) = self.origin.delete(source_path) {
            warn!("could not delete origin file {}: {}", source_path, err);
        }
    }
}
