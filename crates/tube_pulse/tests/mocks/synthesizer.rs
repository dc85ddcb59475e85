use std::{
    path::Path,
    sync::{Arc, Mutex},
};
use tokio_util::sync::CancellationToken;
use tube_pulse::{types::AudioArtifact, ServiceError, Synthesizer};

use super::Failure;

#[derive(Clone)]
pub struct MockSynthesizer {
    pub duration_secs: f64,
    /// Texts that were spoken
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<Failure>,
    /// Cancelled once speech was produced, as if the operator hit Ctrl-C
    pub cancel_after: Option<CancellationToken>,
}

impl Default for MockSynthesizer {
    fn default() -> Self {
        Self {
            duration_secs: 42.0,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
            cancel_after: None,
        }
    }
}

impl MockSynthesizer {
    pub fn failing(failure: Failure) -> Self {
        Self {
            fail_with: Some(failure),
            ..Default::default()
        }
    }
}

impl Synthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        dest: &Path,
    ) -> Result<AudioArtifact, ServiceError> {
        self.calls.lock().unwrap().push(text.to_string());
        if let Some(ref failure) = self.fail_with {
            return Err(failure.to_error(ServiceError::Synthesis));
        }
        std::fs::write(dest, b"mp3")?;
        if let Some(ref token) = self.cancel_after {
            token.cancel();
        }
        Ok(AudioArtifact {
            path: dest.to_path_buf(),
            duration_secs: self.duration_secs,
            voice: voice.to_string(),
        })
    }
}
