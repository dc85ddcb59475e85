use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};
use tokio_util::sync::CancellationToken;
use tube_pulse::{
    types::{AudioArtifact, FinalVideo},
    Composer, ServiceError,
};

#[derive(Clone)]
pub struct MockComposer {
    /// Clip lists handed to each composition
    pub calls: Arc<Mutex<Vec<Vec<PathBuf>>>>,
    pub fail_with: Option<String>,
    /// Leave a truncated file behind before failing
    pub write_partial: bool,
    /// Report success without writing anything
    pub skip_output: bool,
    /// Cancelled as the composition starts
    pub cancel_on_compose: Option<CancellationToken>,
}

impl Default for MockComposer {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            write_partial: false,
            skip_output: false,
            cancel_on_compose: None,
        }
    }
}

impl MockComposer {
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }
}

impl Composer for MockComposer {
    fn compose(
        &self,
        clips: &[PathBuf],
        audio: &AudioArtifact,
        dest: &Path,
    ) -> Result<FinalVideo, ServiceError> {
        self.calls.lock().unwrap().push(clips.to_vec());
        if let Some(ref token) = self.cancel_on_compose {
            token.cancel();
        }
        if let Some(ref msg) = self.fail_with {
            if self.write_partial {
                std::fs::write(dest, b"trunc")?;
            }
            return Err(ServiceError::Encoding(msg.clone()));
        }
        if !self.skip_output {
            std::fs::write(dest, b"final mp4")?;
        }
        Ok(FinalVideo {
            path: dest.to_path_buf(),
            duration_secs: audio.duration_secs,
            clips_used: clips.len(),
            resolution: "1920x1080".into(),
            fps: 30,
        })
    }
}
