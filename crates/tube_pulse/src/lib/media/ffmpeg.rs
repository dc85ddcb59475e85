use std::{
    path::{Path, PathBuf},
    process::Command,
};

use crate::{error::ServiceError, media::MediaProcessor};

/// Locations of the `ffmpeg` and `ffprobe` executables
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self {
            ffmpeg: "ffmpeg".into(),
            ffprobe: "ffprobe".into(),
        }
    }
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }
}

impl MediaProcessor for Ffmpeg {
    fn probe_duration(&self, path: &Path) -> Result<f64, ServiceError> {
        let output = Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-show_entries",
                "format=duration",
                "-of",
                "default=noprint_wrappers=1:nokey=1",
            ])
            .arg(path)
            .output()
            .map_err(|e| ServiceError::Encoding(format!("Failed to spawn ffprobe: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ServiceError::Encoding(format!(
                "ffprobe failed on {}: {}",
                path.display(),
                stderr.trim()
            )));
        }

        parse_duration(&String::from_utf8_lossy(&output.stdout)).ok_or_else(|| {
            ServiceError::Encoding(format!("No duration reported for {}", path.display()))
        })
    }

    fn run(&self, args: &[String]) -> Result<(), ServiceError> {
        tracing::debug!(args = ?args, "Running ffmpeg");

        let output = Command::new(&self.ffmpeg)
            .args(["-hide_banner", "-loglevel", "error", "-y"])
            .args(args)
            .output()
            .map_err(|e| ServiceError::Encoding(format!("Failed to spawn ffmpeg: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(status = ?output.status, stderr = %stderr.trim(), "ffmpeg failed");
            return Err(ServiceError::Encoding(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(())
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    stdout
        .lines()
        .map(str::trim)
        .find_map(|line| line.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("61.440000\n"), Some(61.44));
        assert_eq!(parse_duration("N/A\n12.5\n"), Some(12.5));
        assert_eq!(parse_duration("N/A"), None);
        assert_eq!(parse_duration("0.000000"), None);
    }

    #[test]
    fn test_missing_binary_is_an_encoding_error() {
        let ffmpeg = Ffmpeg::new("/nonexistent/ffmpeg", "/nonexistent/ffprobe");

        let err = ffmpeg.probe_duration(Path::new("x.mp3")).unwrap_err();
        assert!(matches!(err, ServiceError::Encoding(_)));

        let err = ffmpeg.run(&["-version".to_string()]).unwrap_err();
        assert!(matches!(err, ServiceError::Encoding(_)));
    }
}
