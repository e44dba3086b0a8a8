use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use exif::{In, Reader, Tag};
use log::debug;

use super::MediaMetadata;

/// Read capture metadata from a photo's EXIF block.
///
/// EXIF datetimes carry no timezone; the offset lives in a separate tag
/// and is frequently absent.
pub fn extract(path: &Path) -> MediaMetadata {
    let Ok(file) = File::open(path) else {
        return MediaMetadata::empty();
    };
    let Ok(reader) = Reader::new().read_from_container(&mut BufReader::new(file)) else {
        debug!("no EXIF container in {}", path.display());
        return MediaMetadata::empty();
    };

    let field_value = |tag: Tag| -> Option<String> {
        reader.get_field(tag, In::PRIMARY).map(|field| {
            field.display_value().to_string().trim().to_string()
        })
    };

    MediaMetadata {
        capture_time: field_value(Tag::DateTimeOriginal).map(|v| clean_datetime(&v)),
        utc_offset: field_value(Tag::OffsetTimeOriginal),
        subsecond: field_value(Tag::SubSecTimeOriginal),
    }
}

/// Cameras emit datetimes with assorted separators; normalize them all to
/// the `YYYY:MM:DD HH:MM:SS` source format.
fn clean_datetime(value: &str) -> String {
    value
        .replace('-', ":")
        .replace('/', ":")
        .replace('\\', ":")
        .replace('.', ":")
}
