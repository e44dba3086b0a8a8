use std::path::Path;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;

use super::{Provenance, ResolvedDate};

/// `HHMMSS` plus one to six fractional digits, as iOS camera uploads
/// embed in the middle filename component.
static IOS_TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{6}\d{1,6}$").unwrap());

/// Resolve a date from the filename alone. Used only when structured
/// metadata yielded no timestamp; timestamps recovered here are local
/// time as encoded, with no offset to verify.
pub fn resolve(filename: &str, subsecond: &str) -> Option<ResolvedDate> {
    let base = stem(filename);

    // Camera-upload convention: YYYYMMDD_HHMMSSfff_iOS
    let underscore: Vec<&str> = base.split('_').collect();
    if underscore.len() == 3 {
        return from_upload_parts(&underscore, subsecond);
    }

    // Timestamp convention: "YYYY-MM-DD HH.MM.SS"
    let spaced: Vec<&str> = base.split(' ').collect();
    if spaced.len() == 2 {
        return from_timestamp_stem(base, subsecond);
    }

    None
}

fn from_upload_parts(parts: &[&str], subsecond: &str) -> Option<ResolvedDate> {
    let (datestr, timestr, tag) = (parts[0], parts[1], parts[2]);
    if tag != "iOS" {
        return None;
    }
    NaiveDate::parse_from_str(datestr, "%Y%m%d").ok()?;
    if !IOS_TIME_RE.is_match(timestr) {
        return None;
    }
    NaiveTime::parse_from_str(&timestr[..6], "%H%M%S").ok()?;

    Some(ResolvedDate {
        year: Some(datestr[..4].to_string()),
        month: Some(datestr[4..6].to_string()),
        datestr: datestr.to_string(),
        timestr: timestr.to_string(),
        subsecond: subsecond.to_string(),
        provenance: Provenance::FileNaming,
        local_time_only: true,
    })
}

fn from_timestamp_stem(base: &str, subsecond: &str) -> Option<ResolvedDate> {
    let stamp = base.get(..19)?;
    let dt = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%d %H.%M.%S").ok()?;

    Some(ResolvedDate {
        year: Some(dt.format("%Y").to_string()),
        month: Some(dt.format("%m").to_string()),
        datestr: dt.format("%Y%m%d").to_string(),
        timestr: dt.format("%H%M%S").to_string(),
        subsecond: subsecond.to_string(),
        provenance: Provenance::FileNaming,
        local_time_only: true,
    })
}

fn stem(filename: &str) -> &str {
    Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_convention() {
        let resolved = resolve("20230115_153045123_iOS.jpg", "000").unwrap();
        assert_eq!(resolved.provenance, Provenance::FileNaming);
        assert_eq!(resolved.datestr, "20230115");
        assert_eq!(resolved.timestr, "153045123");
        assert_eq!(resolved.year.as_deref(), Some("2023"));
        assert_eq!(resolved.month.as_deref(), Some("01"));
        assert!(resolved.local_time_only);
    }

    #[test]
    fn test_upload_convention_requires_tag_and_valid_parts() {
        assert!(resolve("20230115_153045123_android.jpg", "000").is_none());
        // 13th month
        assert!(resolve("20231315_153045123_iOS.jpg", "000").is_none());
        // bare HHMMSS without fractional digits
        assert!(resolve("20230115_153045_iOS.jpg", "000").is_none());
        // 25th hour
        assert!(resolve("20230115_253045123_iOS.jpg", "000").is_none());
    }

    #[test]
    fn test_timestamp_convention() {
        let resolved = resolve("2023-01-15 15.30.45.jpg", "000").unwrap();
        assert_eq!(resolved.provenance, Provenance::FileNaming);
        assert_eq!(resolved.datestr, "20230115");
        assert_eq!(resolved.timestr, "153045");
        assert_eq!(resolved.year.as_deref(), Some("2023"));
        assert_eq!(resolved.month.as_deref(), Some("01"));
    }

    #[test]
    fn test_unrecognized_shapes() {
        assert!(resolve("IMG_final.jpg", "000").is_none());
        assert!(resolve("random photo name.jpg", "000").is_none());
        assert!(resolve("holiday.jpg", "000").is_none());
    }
}
