pub mod filename;

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::metadata::MediaMetadata;

/// Which fallback strategy produced a resolved date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Structured capture metadata (EXIF / container tags).
    ExifName,
    /// A recognized filename convention.
    FileNaming,
    /// Nothing resolved; the original filename is kept verbatim.
    OriginalName,
}

/// The resolved capture date of one media file, with provenance.
///
/// Immutable once built. `OriginalName` provenance implies `year` and
/// `month` are `None` and the date/time strings are empty.
#[derive(Debug, Clone)]
pub struct ResolvedDate {
    /// 4-digit year, `None` when unresolved.
    pub year: Option<String>,
    /// 2-digit month, `None` when unresolved.
    pub month: Option<String>,
    /// Compact 8-digit date, `YYYYMMDD`.
    pub datestr: String,
    /// Compact time, `HHMMSS` plus any fractional digits a filename
    /// convention carried.
    pub timestr: String,
    /// Exactly three fractional-second digits, `000` when unknown.
    pub subsecond: String,
    pub provenance: Provenance,
    /// True when no UTC offset was available, so the timestamp was not
    /// normalized and is only trusted as local time.
    pub local_time_only: bool,
}

impl ResolvedDate {
    fn unresolved(subsecond: String) -> Self {
        Self {
            year: None,
            month: None,
            datestr: String::new(),
            timestr: String::new(),
            subsecond,
            provenance: Provenance::OriginalName,
            local_time_only: false,
        }
    }

    fn from_datetime(dt: NaiveDateTime, local_time_only: bool, subsecond: &str) -> Self {
        Self {
            year: Some(dt.format("%Y").to_string()),
            month: Some(dt.format("%m").to_string()),
            datestr: dt.format("%Y%m%d").to_string(),
            timestr: dt.format("%H%M%S").to_string(),
            subsecond: subsecond.to_string(),
            provenance: Provenance::ExifName,
            local_time_only,
        }
    }
}

/// Resolve a capture date, trying each strategy in strict order:
/// structured metadata, then filename conventions, then unresolved.
/// First success wins.
pub fn resolve(metadata: &MediaMetadata, original_filename: &str) -> ResolvedDate {
    let subsecond = normalize_subsecond(metadata.subsecond.as_deref());

    if let Some(capture) = metadata
        .capture_time
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        if let Some(resolved) =
            from_capture_time(capture, metadata.utc_offset.as_deref(), &subsecond)
        {
            return resolved;
        }
    }

    if let Some(resolved) = filename::resolve(original_filename, &subsecond) {
        return resolved;
    }

    ResolvedDate::unresolved(subsecond)
}

/// Structured-metadata strategy.
///
/// With a usable offset the timestamp is converted to UTC. Without one
/// (absent or malformed) the timestamp is kept as-is and flagged
/// local-time-only. A malformed timestamp fails the strategy entirely.
fn from_capture_time(
    capture: &str,
    utc_offset: Option<&str>,
    subsecond: &str,
) -> Option<ResolvedDate> {
    let offset = utc_offset.unwrap_or("").trim();
    if !offset.is_empty() {
        let stamped = format!("{}{}", capture, offset);
        if let Ok(dt) = DateTime::parse_from_str(&stamped, "%Y:%m:%d %H:%M:%S%z") {
            let utc = dt.with_timezone(&Utc);
            return Some(ResolvedDate::from_datetime(utc.naive_utc(), false, subsecond));
        }
    }

    let naive = NaiveDateTime::parse_from_str(capture, "%Y:%m:%d %H:%M:%S").ok()?;
    Some(ResolvedDate::from_datetime(naive, true, subsecond))
}

/// Clamp fractional-second digits to exactly three, defaulting to `000`.
fn normalize_subsecond(raw: Option<&str>) -> String {
    let digits: String = raw
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return "000".to_string();
    }
    let mut subsecond = digits;
    subsecond.truncate(3);
    while subsecond.len() < 3 {
        subsecond.push('0');
    }
    subsecond
}
