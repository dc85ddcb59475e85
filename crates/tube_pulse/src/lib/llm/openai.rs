use std::{path::Path, time::Duration};

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tube_datastore::Topic;

use crate::{
    error::ServiceError,
    http::{error_parts, is_timeout, retrying_client},
    llm::{speech::Synthesizer, writer::ScriptDraft, ScriptWriter},
    media::MediaProcessor,
    parser::{build_prompt, LlmResponse, SYSTEM_PROMPT},
    types::AudioArtifact,
};

/// Client for any OpenAI-compatible API (OpenAI, Groq, Ollama's `/v1`).
///
/// One instance can serve as both the script writer and the speech
/// synthesizer, since both live behind the same base url and key.
pub struct OpenAIClient<F: MediaProcessor> {
    client: ClientWithMiddleware,
    api_key: Option<String>,
    base_url: String,
    chat_model: String,
    speech_model: String,
    timeout: Duration,
    target_duration_secs: u32,
    ffmpeg: F,
}

impl<F: MediaProcessor> OpenAIClient<F> {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

    pub fn new(api_key: Option<String>, ffmpeg: F) -> Self {
        Self {
            client: retrying_client(),
            api_key,
            base_url: "https://api.openai.com/v1".into(),
            chat_model: "gpt-4o-mini".into(),
            speech_model: "tts-1".into(),
            timeout: Self::DEFAULT_TIMEOUT,
            target_duration_secs: 60,
            ffmpeg,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_chat_model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = model.into();
        self
    }

    pub fn with_speech_model(mut self, model: impl Into<String>) -> Self {
        self.speech_model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_target_duration(mut self, secs: u32) -> Self {
        self.target_duration_secs = secs;
        self
    }

    fn post(&self, endpoint: &str) -> reqwest_middleware::RequestBuilder {
        let request = self
            .client
            .post(format!("{}/{endpoint}", self.base_url))
            .timeout(self.timeout);

        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    pub async fn send_completion_request(
        &self,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, ServiceError> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "temperature": 0.8,
            "messages": [
                {
                    "role": "system",
                    "content": SYSTEM_PROMPT
                },
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .post("chat/completions")
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|e| {
                if is_timeout(&e) {
                    ServiceError::GenerationTimeout(self.timeout)
                } else {
                    ServiceError::Generation(e.to_string())
                }
            })?;

        if !resp.status().is_success() {
            let (status, message) = error_parts(resp).await;
            return Err(match status {
                429 => ServiceError::QuotaExceeded(message),
                _ => ServiceError::Generation(format!("{status} - {message}")),
            });
        }

        resp.json::<CompletionResponse>()
            .await
            .map_err(|e| ServiceError::Generation(format!("Malformed completion: {e}")))
    }

    pub async fn send_speech_request(
        &self,
        text: &str,
        voice: &str,
    ) -> Result<Vec<u8>, ServiceError> {
        let body = serde_json::json!({
            "model": self.speech_model,
            "input": text,
            "voice": voice,
            "response_format": "mp3"
        });

        let resp = self
            .post("audio/speech")
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))
            .map_err(|e| ServiceError::Synthesis(e.to_string()))?;

        if !resp.status().is_success() {
            let (status, message) = error_parts(resp).await;
            return Err(match status {
                429 => ServiceError::QuotaExceeded(message),
                _ => ServiceError::Synthesis(format!("{status} - {message}")),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ServiceError::Synthesis(e.to_string()))?;

        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: Option<String>,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl CompletionResponse {
    fn into_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
    }
}

impl<F: MediaProcessor + Send + Sync> ScriptWriter for OpenAIClient<F> {
    #[tracing::instrument(skip(self, topic), fields(topic = %topic.title, model = %self.chat_model))]
    async fn generate(&self, topic: &Topic) -> Result<ScriptDraft, ServiceError> {
        let prompt = build_prompt(topic, self.target_duration_secs);

        let content = self
            .send_completion_request(prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to generate script"))?
            .into_content()
            .ok_or_else(|| ServiceError::Generation("No content in response".into()))?;

        let draft = LlmResponse::from(content).parse_script(&topic.title);
        tracing::info!(title = %draft.title, tags = draft.tags.len(), "Script drafted");

        Ok(draft)
    }
}

impl<F: MediaProcessor + Send + Sync> Synthesizer for OpenAIClient<F> {
    #[tracing::instrument(skip(self, text, dest), fields(chars = text.len(), dest = %dest.display()))]
    async fn synthesize(
        &self,
        text: &str,
        voice: &str,
        dest: &Path,
    ) -> Result<AudioArtifact, ServiceError> {
        if text.trim().is_empty() {
            return Err(ServiceError::Synthesis("Nothing to speak".into()));
        }

        let audio = self
            .send_speech_request(text, voice)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to synthesize speech"))?;

        if audio.is_empty() {
            return Err(ServiceError::Synthesis("Empty audio response".into()));
        }

        tokio::fs::write(dest, &audio).await?;

        let duration_secs = self
            .ffmpeg
            .probe_duration(dest)
            .map_err(|e| ServiceError::Synthesis(format!("Unreadable audio: {e}")))?;

        tracing::info!(bytes = audio.len(), duration_secs, "Voiceover written");

        Ok(AudioArtifact {
            path: dest.to_path_buf(),
            duration_secs,
            voice: voice.to_string(),
        })
    }
}
