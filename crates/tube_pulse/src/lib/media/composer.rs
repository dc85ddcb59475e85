//! Video composition.
//!
//! Every clip gets an equal share of the narration. Longer clips are cut
//! from their middle, shorter ones are slowed down (never below half
//! speed), and neighbouring clips fade into each other. The normalized
//! clips are concatenated, looped or cut to the narration length and
//! muxed with the voiceover.

use std::path::{Path, PathBuf};

use rayon::prelude::*;

use crate::{
    error::ServiceError,
    media::{path_arg, Composer, MediaProcessor},
    types::{AudioArtifact, FinalVideo},
};

pub const FADE_SECS: f64 = 0.5;
/// Slowest playback rate applied to a short clip
pub const MIN_SPEED: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            fps: 30,
        }
    }
}

impl VideoSettings {
    pub fn resolution(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// How one source clip is cut before concatenation
#[derive(Debug, Clone, PartialEq)]
pub struct ClipPlan {
    pub source: PathBuf,
    /// Offset into the source, for clips cut from the middle
    pub start: Option<f64>,
    /// Playback rate below 1.0 for slowed clips
    pub speed: Option<f64>,
    /// Length of the clip after cutting or slowing
    pub length: f64,
    pub fade_in: bool,
    pub fade_out: bool,
}

/// Plans the cut of each `(path, duration)` clip so the sequence spans
/// roughly `total_secs`
pub fn plan_clips(clips: &[(PathBuf, f64)], total_secs: f64) -> Vec<ClipPlan> {
    if clips.is_empty() {
        return Vec::new();
    }

    let per_clip = total_secs / clips.len() as f64;
    let last = clips.len() - 1;

    clips
        .iter()
        .enumerate()
        .map(|(idx, (source, duration))| {
            let (start, speed, length) = if *duration > per_clip {
                (Some((duration - per_clip) / 2.0), None, per_clip)
            } else {
                let factor = duration / per_clip;
                if factor > MIN_SPEED && factor < 1.0 {
                    (None, Some(factor), per_clip)
                } else {
                    (None, None, *duration)
                }
            };

            ClipPlan {
                source: source.clone(),
                start,
                speed,
                length,
                fade_in: idx > 0,
                fade_out: idx < last,
            }
        })
        .collect()
}

impl ClipPlan {
    fn filter_chain(&self, video: &VideoSettings) -> String {
        let (w, h) = (video.width, video.height);
        let mut filters = vec![
            format!("scale={w}:{h}:force_original_aspect_ratio=increase"),
            format!("crop={w}:{h}"),
            "setsar=1".to_string(),
        ];

        if let Some(speed) = self.speed {
            filters.push(format!("setpts={:.6}*PTS", 1.0 / speed));
        }
        filters.push(format!("fps={}", video.fps));

        let fade = FADE_SECS.min(self.length / 2.0);
        if self.fade_in {
            filters.push(format!("fade=t=in:st=0:d={fade:.3}"));
        }
        if self.fade_out {
            let start = (self.length - fade).max(0.0);
            filters.push(format!("fade=t=out:st={start:.3}:d={fade:.3}"));
        }

        filters.join(",")
    }

    fn normalize_args(&self, video: &VideoSettings, out: &Path) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(start) = self.start {
            args.extend(["-ss".to_string(), format!("{start:.3}")]);
        }
        args.extend(["-i".to_string(), path_arg(&self.source)]);
        args.extend([
            "-t".to_string(),
            format!("{:.3}", self.length),
            "-an".to_string(),
            "-vf".to_string(),
            self.filter_chain(video),
        ]);
        args.extend(encoder_args());
        args.push(path_arg(out));
        args
    }
}

fn encoder_args() -> [String; 8] {
    [
        "-c:v".into(),
        "libx264".into(),
        "-preset".into(),
        "medium".into(),
        "-crf".into(),
        "23".into(),
        "-pix_fmt".into(),
        "yuv420p".into(),
    ]
}

fn concat_list(parts: &[PathBuf]) -> String {
    parts
        .iter()
        .map(|p| format!("file '{}'\n", path_arg(p).replace('\'', r"'\''")))
        .collect()
}

/// [`Composer`] that shells out to ffmpeg
pub struct FfmpegComposer<F: MediaProcessor> {
    ffmpeg: F,
    video: VideoSettings,
}

impl<F: MediaProcessor + Sync> FfmpegComposer<F> {
    pub fn new(ffmpeg: F, video: VideoSettings) -> Self {
        Self { ffmpeg, video }
    }

    fn compose_in(
        &self,
        work_dir: &Path,
        clips: &[PathBuf],
        audio: &AudioArtifact,
        dest: &Path,
    ) -> Result<usize, ServiceError> {
        let mut probed = Vec::with_capacity(clips.len());
        for clip in clips {
            if !clip.is_file() {
                tracing::warn!(clip = %clip.display(), "Clip not found, skipping");
                continue;
            }
            match self.ffmpeg.probe_duration(clip) {
                Ok(duration) => probed.push((clip.clone(), duration)),
                Err(e) => tracing::warn!(clip = %clip.display(), error = %e, "Unreadable clip, skipping"),
            }
        }

        if probed.is_empty() {
            return Err(ServiceError::Encoding("No usable video clips".into()));
        }

        let plans = plan_clips(&probed, audio.duration_secs);
        tracing::info!(
            clips = plans.len(),
            per_clip_secs = audio.duration_secs / plans.len() as f64,
            "Normalizing clips"
        );

        let parts = plans
            .par_iter()
            .enumerate()
            .map(|(idx, plan)| {
                let out = work_dir.join(format!("part_{idx:03}.mp4"));
                self.ffmpeg.run(&plan.normalize_args(&self.video, &out))?;
                Ok(out)
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        let list_path = work_dir.join("concat.txt");
        std::fs::write(&list_path, concat_list(&parts))?;

        let mut args = vec![
            "-f".to_string(),
            "concat".into(),
            "-safe".into(),
            "0".into(),
            "-stream_loop".into(),
            "-1".into(),
            "-i".into(),
            path_arg(&list_path),
            "-i".into(),
            path_arg(&audio.path),
            "-map".into(),
            "0:v:0".into(),
            "-map".into(),
            "1:a:0".into(),
            "-t".into(),
            format!("{:.3}", audio.duration_secs),
            "-r".into(),
            self.video.fps.to_string(),
        ];
        args.extend(encoder_args());
        args.extend([
            "-c:a".to_string(),
            "aac".into(),
            "-b:a".into(),
            "192k".into(),
            "-movflags".into(),
            "+faststart".into(),
            "-f".into(),
            "mp4".into(),
            path_arg(dest),
        ]);

        tracing::info!(dest = %dest.display(), "Encoding final video");
        self.ffmpeg.run(&args)?;

        Ok(parts.len())
    }
}

impl<F: MediaProcessor + Sync> Composer for FfmpegComposer<F> {
    #[tracing::instrument(skip(self, clips, audio, dest), fields(clips = clips.len(), dest = %dest.display()))]
    fn compose(
        &self,
        clips: &[PathBuf],
        audio: &AudioArtifact,
        dest: &Path,
    ) -> Result<FinalVideo, ServiceError> {
        if clips.is_empty() {
            return Err(ServiceError::Encoding("No video clips provided".into()));
        }
        if !audio.path.is_file() {
            return Err(ServiceError::Encoding(format!(
                "Audio file not found: {}",
                audio.path.display()
            )));
        }

        let work_dir = dest.with_extension("work");
        std::fs::create_dir_all(&work_dir)?;

        let composed = self.compose_in(&work_dir, clips, audio, dest);

        if let Err(e) = std::fs::remove_dir_all(&work_dir) {
            tracing::warn!(error = %e, dir = %work_dir.display(), "Failed to clean up work dir");
        }

        let clips_used = composed?;

        Ok(FinalVideo {
            path: dest.to_path_buf(),
            duration_secs: audio.duration_secs,
            clips_used,
            resolution: self.video.resolution(),
            fps: self.video.fps,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Default, Clone)]
    struct FakeFfmpeg {
        runs: Arc<Mutex<Vec<Vec<String>>>>,
        duration: f64,
    }

    impl MediaProcessor for FakeFfmpeg {
        fn probe_duration(&self, _path: &Path) -> Result<f64, ServiceError> {
            Ok(self.duration)
        }

        fn run(&self, args: &[String]) -> Result<(), ServiceError> {
            self.runs.lock().unwrap().push(args.to_vec());
            if let Some(out) = args.last() {
                std::fs::write(out, b"video")?;
            }
            Ok(())
        }
    }

    fn clip(name: &str, duration: f64) -> (PathBuf, f64) {
        (PathBuf::from(name), duration)
    }

    #[test]
    fn test_long_clips_are_cut_from_the_middle() {
        let plans = plan_clips(&[clip("a.mp4", 30.0), clip("b.mp4", 30.0)], 40.0);

        assert_eq!(plans[0].start, Some(5.0));
        assert_eq!(plans[0].length, 20.0);
        assert_eq!(plans[0].speed, None);
    }

    #[test]
    fn test_short_clips_slow_down_but_not_below_half_speed() {
        let plans = plan_clips(&[clip("a.mp4", 8.0), clip("b.mp4", 4.0)], 20.0);

        assert_eq!(plans[0].speed, Some(0.8));
        assert_eq!(plans[0].length, 10.0);

        // 0.4x would be too slow, so the clip plays as-is
        assert_eq!(plans[1].speed, None);
        assert_eq!(plans[1].length, 4.0);
    }

    #[test]
    fn test_fades_skip_the_outer_edges() {
        let plans = plan_clips(
            &[clip("a.mp4", 10.0), clip("b.mp4", 10.0), clip("c.mp4", 10.0)],
            30.0,
        );

        let fades: Vec<_> = plans.iter().map(|p| (p.fade_in, p.fade_out)).collect();
        assert_eq!(fades, vec![(false, true), (true, true), (true, false)]);
    }

    #[test]
    fn test_filter_chain_scales_crops_and_fades() {
        let plan = ClipPlan {
            source: "a.mp4".into(),
            start: None,
            speed: Some(0.5),
            length: 10.0,
            fade_in: true,
            fade_out: true,
        };

        let chain = plan.filter_chain(&VideoSettings::default());

        assert_eq!(
            chain,
            "scale=1920:1080:force_original_aspect_ratio=increase,crop=1920:1080,setsar=1,\
setpts=2.000000*PTS,fps=30,fade=t=in:st=0:d=0.500,fade=t=out:st=9.500:d=0.500"
        );
    }

    #[test]
    fn test_compose_skips_missing_clips_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let clip_a = dir.path().join("clip_0_0.mp4");
        std::fs::write(&clip_a, b"clip").unwrap();
        let audio_path = dir.path().join("voiceover.mp3");
        std::fs::write(&audio_path, b"audio").unwrap();

        let ffmpeg = FakeFfmpeg {
            duration: 12.0,
            ..Default::default()
        };
        let composer = FfmpegComposer::new(ffmpeg.clone(), VideoSettings::default());
        let audio = AudioArtifact {
            path: audio_path,
            duration_secs: 6.0,
            voice: "alloy".into(),
        };
        let dest = dir.path().join("final.mp4");

        let video = composer
            .compose(&[clip_a, dir.path().join("missing.mp4")], &audio, &dest)
            .unwrap();

        assert_eq!(video.clips_used, 1);
        assert_eq!(video.resolution, "1920x1080");
        assert_eq!(video.duration_secs, 6.0);
        assert!(dest.is_file());
        assert!(!dest.with_extension("work").exists());

        let runs = ffmpeg.runs.lock().unwrap();
        assert_eq!(runs.len(), 2);
        let final_args = &runs[1];
        assert!(final_args.windows(2).any(|w| w[0] == "-t" && w[1] == "6.000"));
        assert!(final_args.windows(2).any(|w| w[0] == "-stream_loop" && w[1] == "-1"));
    }

    #[test]
    fn test_compose_without_usable_clips_fails() {
        let dir = tempfile::tempdir().unwrap();
        let audio_path = dir.path().join("voiceover.mp3");
        std::fs::write(&audio_path, b"audio").unwrap();
        let composer = FfmpegComposer::new(FakeFfmpeg::default(), VideoSettings::default());
        let audio = AudioArtifact {
            path: audio_path,
            duration_secs: 6.0,
            voice: "alloy".into(),
        };

        let err = composer
            .compose(&[dir.path().join("gone.mp4")], &audio, &dir.path().join("out.mp4"))
            .unwrap_err();

        assert!(matches!(err, ServiceError::Encoding(_)));
    }
}
