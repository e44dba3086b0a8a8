use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Destination-side folder names for the three media buckets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FolderNames {
    pub images_folder_name: String,
    pub screenshot_folder_name: String,
    pub videos_folder_name: String,
}

/// The drive receiving all relocated media.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Local mount point of the destination drive.
    pub mount: String,
    /// Path of the library root within the drive.
    pub path: String,
}

/// One origin drive to sweep.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginProfile {
    pub profile_name: String,
    /// Local mount point of the origin drive.
    pub mount: String,
    /// Folder within the drive to relocate from, e.g. the camera roll.
    pub source_path: String,
    /// Per-profile folder under the destination library root.
    pub destination_folder: String,
}

/// Full run configuration, loaded from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub destination: DestinationConfig,
    pub origins: Vec<OriginProfile>,
    pub constants: FolderNames,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("opening config file {}", path.display()))?;
        let config: Config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "destination": { "mount": "/mnt/library", "path": "Pictures" },
                "origins": [
                    {
                        "profile_name": "phone",
                        "mount": "/mnt/phone",
                        "source_path": "Camera Roll",
                        "destination_folder": "phone"
                    }
                ],
                "constants": {
                    "images_folder_name": "images",
                    "screenshot_folder_name": "screenshots",
                    "videos_folder_name": "videos"
                }
            }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.origins.len(), 1);
        assert_eq!(config.origins[0].profile_name, "phone");
        assert_eq!(config.constants.videos_folder_name, "videos");
    }

    #[test]
    fn test_missing_file_errors() {
        assert!(Config::load(Path::new("/no/such/config.json")).is_err());
    }
}
