pub mod exif;
pub mod video;

use std::path::Path;

use crate::name::MediaKind;

/// Normalized capture metadata for one media file.
///
/// Absence is represented as `None`/empty fields, never as an error; the
/// date resolver treats the two the same.
#[derive(Debug, Clone, Default)]
pub struct MediaMetadata {
    /// Source-format timestamp, `YYYY:MM:DD HH:MM:SS`.
    pub capture_time: Option<String>,
    /// Signed UTC offset, e.g. `+02:00`.
    pub utc_offset: Option<String>,
    /// Fractional-second digits as captured.
    pub subsecond: Option<String>,
}

impl MediaMetadata {
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Extract capture metadata for a local file of the given kind.
/// Unreadable files and missing tags yield empty metadata.
pub fn extract(path: &Path, kind: MediaKind) -> MediaMetadata {
    match kind {
        MediaKind::Photo => exif::extract(path),
        MediaKind::Video => video::extract(path),
    }
}
