use std::path::PathBuf;

use clap::ArgAction;

use crate::{
    error::Error,
    media::{ThumbnailStyle, VideoSettings},
    stock::FootageSize,
    upload::{OAuthCredentials, PrivacyStatus, DEFAULT_CATEGORY_ID},
};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Every runtime setting, readable from flags, the environment or `.env`
#[derive(Debug, Clone, clap::Args)]
pub struct Settings {
    /// Directory that receives one `run_<label>` folder per run
    #[arg(long = "output-root", env = "OUTPUT_DIR", default_value = "output")]
    pub output_root: PathBuf,

    /// Topic catalog with the rotation index
    #[arg(long, env = "TOPICS_PATH", default_value = "config/topics.json")]
    pub topics_path: PathBuf,

    /// Write scripts with a local Ollama server instead of Groq
    #[arg(long, env = "USE_OLLAMA", default_value_t = true, action = ArgAction::Set)]
    pub use_ollama: bool,

    #[arg(long, env = "OLLAMA_BASE_URL", default_value = "http://localhost:11434/v1")]
    pub ollama_base_url: String,

    #[arg(long, env = "OLLAMA_MODEL", default_value = "llama3.1:8b")]
    pub ollama_model: String,

    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub groq_api_key: Option<String>,

    #[arg(long, env = "GROQ_MODEL", default_value = "llama-3.1-8b-instant")]
    pub groq_model: String,

    /// Target narration length in seconds
    #[arg(long, default_value_t = 60)]
    pub duration: u32,

    /// Key for the speech API; local servers usually need none
    #[arg(long, env = "TTS_API_KEY", hide_env_values = true)]
    pub tts_api_key: Option<String>,

    #[arg(long, env = "TTS_BASE_URL", default_value = "https://api.openai.com/v1")]
    pub tts_base_url: String,

    #[arg(long, env = "TTS_MODEL", default_value = "tts-1")]
    pub tts_model: String,

    #[arg(long, env = "TTS_VOICE", default_value = "alloy")]
    pub tts_voice: String,

    #[arg(long, env = "PEXELS_API_KEY", hide_env_values = true)]
    pub pexels_api_key: Option<String>,

    #[arg(long, value_enum, default_value_t = FootageSize::Medium)]
    pub footage_size: FootageSize,

    /// Stock clips downloaded per search query
    #[arg(long, default_value_t = 2)]
    pub clips_per_query: usize,

    #[arg(long, env = "VIDEO_WIDTH", default_value_t = 1920)]
    pub video_width: u32,

    #[arg(long, env = "VIDEO_HEIGHT", default_value_t = 1080)]
    pub video_height: u32,

    #[arg(long, env = "VIDEO_FPS", default_value_t = 30)]
    pub video_fps: u32,

    #[arg(long, env = "YOUTUBE_CLIENT_ID")]
    pub youtube_client_id: Option<String>,

    #[arg(long, env = "YOUTUBE_CLIENT_SECRET", hide_env_values = true)]
    pub youtube_client_secret: Option<String>,

    #[arg(long, env = "YOUTUBE_REFRESH_TOKEN", hide_env_values = true)]
    pub youtube_refresh_token: Option<String>,

    #[arg(long, env = "YOUTUBE_PRIVACY_STATUS", value_enum, default_value_t = PrivacyStatus::Private)]
    pub youtube_privacy_status: PrivacyStatus,

    #[arg(long, env = "YOUTUBE_CATEGORY_ID", default_value = DEFAULT_CATEGORY_ID)]
    pub youtube_category_id: String,
}

/// Where scripts get written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmBackend {
    Ollama { base_url: String, model: String },
    Groq { api_key: String, model: String },
}

impl LlmBackend {
    pub fn base_url(&self) -> &str {
        match self {
            LlmBackend::Ollama { base_url, .. } => base_url,
            LlmBackend::Groq { .. } => GROQ_BASE_URL,
        }
    }

    pub fn api_key(&self) -> Option<String> {
        match self {
            LlmBackend::Ollama { .. } => None,
            LlmBackend::Groq { api_key, .. } => Some(api_key.clone()),
        }
    }

    pub fn model(&self) -> &str {
        match self {
            LlmBackend::Ollama { model, .. } | LlmBackend::Groq { model, .. } => model,
        }
    }
}

fn required(value: &Option<String>, key: &'static str) -> Result<String, Error> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(Error::ConfigurationMissing(key))
}

impl Settings {
    pub fn llm_backend(&self) -> Result<LlmBackend, Error> {
        if self.use_ollama {
            return Ok(LlmBackend::Ollama {
                base_url: self.ollama_base_url.clone(),
                model: self.ollama_model.clone(),
            });
        }

        Ok(LlmBackend::Groq {
            api_key: required(&self.groq_api_key, "GROQ_API_KEY")?,
            model: self.groq_model.clone(),
        })
    }

    pub fn require_pexels_api_key(&self) -> Result<String, Error> {
        required(&self.pexels_api_key, "PEXELS_API_KEY")
    }

    pub fn youtube_credentials(&self) -> Result<OAuthCredentials, Error> {
        Ok(OAuthCredentials {
            client_id: required(&self.youtube_client_id, "YOUTUBE_CLIENT_ID")?,
            client_secret: required(&self.youtube_client_secret, "YOUTUBE_CLIENT_SECRET")?,
            refresh_token: required(&self.youtube_refresh_token, "YOUTUBE_REFRESH_TOKEN")?,
        })
    }

    pub fn video_settings(&self) -> VideoSettings {
        VideoSettings {
            width: self.video_width,
            height: self.video_height,
            fps: self.video_fps,
        }
    }

    pub fn thumbnail_style(&self) -> ThumbnailStyle {
        ThumbnailStyle::default()
    }
}

/// Per-invocation inputs of the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Overrides rotation when set
    pub topic: Option<String>,
    pub skip_upload: bool,
    pub output_root: PathBuf,
}

impl PipelineConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            topic: None,
            skip_upload: false,
            output_root: output_root.into(),
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn skip_upload(mut self, skip: bool) -> Self {
        self.skip_upload = skip;
        self
    }
}
