use std::path::Path;

use crate::date::{Provenance, ResolvedDate};

/// Media kind, driving the filename prefix and the destination folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
}

impl MediaKind {
    /// Classify a filename by its mime type. Returns `None` for anything
    /// that is neither an image nor a video.
    pub fn from_filename(filename: &str) -> Option<Self> {
        if let Some(mime) = mime_guess::from_path(filename).first() {
            if mime.type_() == mime_guess::mime::IMAGE {
                return Some(MediaKind::Photo);
            }
            if mime.type_() == mime_guess::mime::VIDEO {
                return Some(MediaKind::Video);
            }
        }
        // HEIC is not in every mime table
        match extension(filename).as_str() {
            "heic" | "heif" => Some(MediaKind::Photo),
            _ => None,
        }
    }

    fn prefix(self) -> &'static str {
        match self {
            MediaKind::Photo => "p",
            MediaKind::Video => "v",
        }
    }
}

/// Compose the canonical destination filename for a resolved date.
///
/// Pure; the disambiguation sequence is inserted separately via
/// `with_sequence` when a collision proves the destination distinct.
pub fn compose(resolved: &ResolvedDate, original_filename: &str, kind: MediaKind) -> String {
    if resolved.provenance == Provenance::OriginalName {
        return original_filename.to_string();
    }

    let ext = extension(original_filename);
    let time = resolved.timestr.get(..6).unwrap_or(&resolved.timestr);

    match kind {
        // Videos carry no subsecond and no local-time marker.
        MediaKind::Video => format!("{}_{}_{}.{}", kind.prefix(), resolved.datestr, time, ext),
        MediaKind::Photo => {
            let lt = if resolved.local_time_only { "_lt" } else { "" };
            format!(
                "{}_{}_{}_{}{}.{}",
                kind.prefix(),
                resolved.datestr,
                time,
                resolved.subsecond,
                lt,
                ext
            )
        }
    }
}

/// Insert `_{sequence}` before the extension: `p_x.jpg` -> `p_x_1.jpg`.
pub fn with_sequence(filename: &str, sequence: u32) -> String {
    match filename.rsplit_once('.') {
        Some((stem, ext)) => format!("{}_{}.{}", stem, sequence, ext),
        None => format!("{}_{}", filename, sequence),
    }
}

/// Lower-cased extension: the last dot-delimited segment of the base name.
pub fn extension(filename: &str) -> String {
    let basename = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);
    basename
        .rsplit('.')
        .next()
        .unwrap_or(basename)
        .to_lowercase()
}
