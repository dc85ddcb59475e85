use std::{future::Future, path::Path};

use crate::{error::ServiceError, types::AudioArtifact};

/// Text-to-speech backend
pub trait Synthesizer {
    /// Speaks `text` with `voice` and writes the audio to `dest`
    fn synthesize(
        &self,
        text: &str,
        voice: &str,
        dest: &Path,
    ) -> impl Future<Output = Result<AudioArtifact, ServiceError>> + Send;
}

impl<T: Synthesizer + Send + Sync> Synthesizer for &T {
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        dest: &Path,
    ) -> Result<AudioArtifact, ServiceError> {
        (**self).synthesize(text, voice, dest).await
    }
}
