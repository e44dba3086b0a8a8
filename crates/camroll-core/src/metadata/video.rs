use std::path::Path;
use std::process::Command;

use chrono::{DateTime, FixedOffset};
use log::debug;

use super::MediaMetadata;

/// Read the container creation time of a video via `ffprobe`.
///
/// A missing binary, a probe failure, or an absent `creation_time` tag all
/// yield empty metadata; the date resolver then falls back to filename
/// conventions.
pub fn extract(path: &Path) -> MediaMetadata {
    match probe_creation_time(path) {
        Some(dt) => MediaMetadata {
            capture_time: Some(dt.format("%Y:%m:%d %H:%M:%S").to_string()),
            utc_offset: Some(dt.offset().to_string()),
            subsecond: Some(format!("{:03}", dt.timestamp_subsec_millis())),
        },
        None => MediaMetadata::empty(),
    }
}

fn probe_creation_time(path: &Path) -> Option<DateTime<FixedOffset>> {
    let output = Command::new("ffprobe")
        .arg("-v")
        .arg("quiet")
        .arg("-print_format")
        .arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .ok()?;
    if !output.status.success() {
        debug!("ffprobe failed for {}", path.display());
        return None;
    }

    let probe: serde_json::Value = serde_json::from_slice(&output.stdout).ok()?;
    let creation_time = probe
        .get("format")?
        .get("tags")?
        .get("creation_time")?
        .as_str()?;

    parse_creation_time(creation_time)
}

/// Container creation times come as `2015-09-06T21:14:19.000000Z`, with the
/// fraction occasionally missing.
fn parse_creation_time(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%z"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_creation_time_formats() {
        let dt = parse_creation_time("2015-09-06T21:14:19.000000Z").unwrap();
        assert_eq!(dt.format("%Y:%m:%d %H:%M:%S").to_string(), "2015:09:06 21:14:19");
        assert_eq!(dt.offset().to_string(), "+00:00");

        let with_offset = parse_creation_time("2023-01-15T15:30:45.500+02:00").unwrap();
        assert_eq!(with_offset.timestamp_subsec_millis(), 500);
        assert_eq!(with_offset.offset().to_string(), "+02:00");

        assert!(parse_creation_time("not a timestamp").is_none());
    }

    #[test]
    fn test_unprobeable_file_yields_empty_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp4");
        std::fs::write(&path, b"not a real container").unwrap();
        let metadata = extract(&path);
        assert!(metadata.capture_time.is_none());
    }
}
