//! On-disk layout of a pipeline run.
//!
//! ```text
//! <output_root>/run_<label>/
//!     script.json
//!     audio/voiceover.mp3          audio_metadata.json
//!     clips/clip_<q>_<n>.mp4       visuals_metadata.json
//!     thumbnails/thumbnail.jpg     thumbnail_metadata.json
//!     videos/final_video.mp4       video_metadata.json
//!                                  upload_metadata.json
//!                                  pipeline_results.json
//! ```

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

pub const SCRIPT_RECORD: &str = "script.json";
pub const AUDIO_RECORD: &str = "audio_metadata.json";
pub const VISUALS_RECORD: &str = "visuals_metadata.json";
pub const THUMBNAIL_RECORD: &str = "thumbnail_metadata.json";
pub const VIDEO_RECORD: &str = "video_metadata.json";
pub const UPLOAD_RECORD: &str = "upload_metadata.json";
pub const RESULTS_RECORD: &str = "pipeline_results.json";

const SUBDIRS: [&str; 4] = ["audio", "clips", "thumbnails", "videos"];

/// Paths of one run directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLayout {
    root: PathBuf,
}

impl RunLayout {
    pub fn new(output_root: impl AsRef<Path>, label: &str) -> Self {
        Self {
            root: output_root.as_ref().join(format!("run_{label}")),
        }
    }

    /// Creates the run directory tree; existing directories are kept
    pub fn prepare(&self) -> std::io::Result<()> {
        for dir in SUBDIRS {
            std::fs::create_dir_all(self.root.join(dir))?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn record(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    pub fn audio(&self) -> PathBuf {
        self.root.join("audio").join("voiceover.mp3")
    }

    pub fn clip(&self, query_idx: usize, clip_idx: usize) -> PathBuf {
        self.root
            .join("clips")
            .join(format!("clip_{query_idx}_{clip_idx}.mp4"))
    }

    pub fn thumbnail(&self) -> PathBuf {
        self.root.join("thumbnails").join("thumbnail.jpg")
    }

    pub fn video(&self) -> PathBuf {
        self.root.join("videos").join("final_video.mp4")
    }

    /// Where composition writes before the video is promoted to [`Self::video`]
    pub fn staging_video(&self) -> PathBuf {
        self.root.join("videos").join("final_video.partial.mp4")
    }
}

/// Pretty-prints `value` into `path`
pub fn write_record<T: Serialize>(path: &Path, value: &T) -> Result<(), crate::Error> {
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn read_record<T: DeserializeOwned>(path: &Path) -> Result<T, crate::Error> {
    let bytes = std::fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Thumbnail;

    #[test]
    fn test_prepare_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let layout = RunLayout::new(dir.path(), "20250101_120000");

        layout.prepare().unwrap();
        std::fs::write(layout.audio(), b"keep").unwrap();
        layout.prepare().unwrap();

        assert!(layout.root().ends_with("run_20250101_120000"));
        for sub in SUBDIRS {
            assert!(layout.root().join(sub).is_dir());
        }
        assert_eq!(std::fs::read(layout.audio()).unwrap(), b"keep");
    }

    #[test]
    fn test_artifact_paths() {
        let layout = RunLayout::new("/out", "x");

        assert_eq!(layout.clip(1, 0), PathBuf::from("/out/run_x/clips/clip_1_0.mp4"));
        assert_eq!(layout.video(), PathBuf::from("/out/run_x/videos/final_video.mp4"));
        assert_ne!(layout.staging_video(), layout.video());
        assert_eq!(layout.record(SCRIPT_RECORD), PathBuf::from("/out/run_x/script.json"));
    }

    #[test]
    fn test_records_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(THUMBNAIL_RECORD);
        let thumbnail = Thumbnail {
            path: "thumbnails/thumbnail.jpg".into(),
            title: "Bees".into(),
        };

        write_record(&path, &thumbnail).unwrap();
        let raw: serde_json::Value = read_record(&path).unwrap();

        assert_eq!(raw["thumbnail_path"], "thumbnails/thumbnail.jpg");
        assert_eq!(read_record::<Thumbnail>(&path).unwrap(), thumbnail);
    }
}
