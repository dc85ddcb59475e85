//! Local media work: probing, composing and thumbnail rendering, all
//! driven through the ffmpeg command line tools.

use std::path::{Path, PathBuf};

use crate::{
    error::ServiceError,
    types::{AudioArtifact, FinalVideo, Thumbnail},
};

pub mod composer;
pub mod ffmpeg;
pub mod thumbnail;

pub use composer::{FfmpegComposer, VideoSettings};
pub use ffmpeg::Ffmpeg;
pub use thumbnail::{FfmpegThumbnailer, Rgb, ThumbnailStyle};

/// Thin seam over the ffmpeg binaries so that composition logic can be
/// exercised without them
pub trait MediaProcessor {
    /// Container duration in seconds
    fn probe_duration(&self, path: &Path) -> Result<f64, ServiceError>;

    /// Runs ffmpeg with `args`, overwriting any output
    fn run(&self, args: &[String]) -> Result<(), ServiceError>;
}

impl<T: MediaProcessor> MediaProcessor for &T {
    fn probe_duration(&self, path: &Path) -> Result<f64, ServiceError> {
        (*self).probe_duration(path)
    }

    fn run(&self, args: &[String]) -> Result<(), ServiceError> {
        (*self).run(args)
    }
}

pub trait ThumbnailRenderer {
    fn render(
        &self,
        title: &str,
        style: &ThumbnailStyle,
        dest: &Path,
    ) -> Result<Thumbnail, ServiceError>;
}

/// Combines stock clips and narration into a single video
pub trait Composer {
    /// Writes the composed video to `dest`. A failed call may leave a
    /// partial file at `dest`; callers own its cleanup.
    fn compose(
        &self,
        clips: &[PathBuf],
        audio: &AudioArtifact,
        dest: &Path,
    ) -> Result<FinalVideo, ServiceError>;
}

impl<T: ThumbnailRenderer> ThumbnailRenderer for &T {
    fn render(
        &self,
        title: &str,
        style: &ThumbnailStyle,
        dest: &Path,
    ) -> Result<Thumbnail, ServiceError> {
        (*self).render(title, style, dest)
    }
}

impl<T: Composer> Composer for &T {
    fn compose(
        &self,
        clips: &[PathBuf],
        audio: &AudioArtifact,
        dest: &Path,
    ) -> Result<FinalVideo, ServiceError> {
        (*self).compose(clips, audio, dest)
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.to_string_lossy().to_string()
}
