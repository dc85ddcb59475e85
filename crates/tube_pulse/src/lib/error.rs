use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::types::Stage;

/// Failures reported by external collaborators (LLM, TTS, stock footage,
/// rendering, encoding, video hosting)
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Generation timed out after {0:?}")]
    GenerationTimeout(Duration),
    #[error("Generation failed: {0}")]
    Generation(String),
    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Rendering failed: {0}")]
    Render(String),
    #[error("Encoding failed: {0}")]
    Encoding(String),
    #[error("Credentials expired: {0}")]
    AuthExpired(String),
    #[error("Upload rejected: {0}")]
    UploadRejected(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP middleware error: {0}")]
    Middleware(#[from] reqwest_middleware::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors surfaced by the pipeline orchestrator
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration key {0} is not set")]
    ConfigurationMissing(&'static str),
    #[error("Input for {stage} stage is missing: {}", path.display())]
    StageInputMissing { stage: Stage, path: PathBuf },
    #[error("{stage} stage failed: {source}")]
    ExternalService {
        stage: Stage,
        #[source]
        source: ServiceError,
    },
    #[error("{stage} stage hit a quota limit, retry later: {message}")]
    QuotaExceeded { stage: Stage, message: String },
    #[error("No topics configured")]
    NoTopicsConfigured,
    #[error("Topic store error: {0:#}")]
    TopicStore(anyhow::Error),
    #[error("Run interrupted at the {0} stage")]
    Interrupted(Stage),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Tags a collaborator failure with the stage it happened in.
    /// Quota failures are split out since callers can act on them.
    pub fn service(stage: Stage, source: ServiceError) -> Self {
        match source {
            ServiceError::QuotaExceeded(message) => Error::QuotaExceeded { stage, message },
            source => Error::ExternalService { stage, source },
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Error::ConfigurationMissing(_) => FailureKind::ConfigurationMissing,
            Error::StageInputMissing { .. } => FailureKind::StageInputMissing,
            Error::ExternalService { .. } => FailureKind::ExternalService,
            Error::QuotaExceeded { .. } => FailureKind::QuotaExceeded,
            Error::NoTopicsConfigured => FailureKind::NoTopicsConfigured,
            Error::TopicStore(_) => FailureKind::TopicStore,
            Error::Interrupted(_) => FailureKind::Interrupted,
            Error::Io(_) | Error::Json(_) => FailureKind::Io,
        }
    }
}

/// Serializable classification of an [`Error`], stored in run results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ConfigurationMissing,
    StageInputMissing,
    ExternalService,
    QuotaExceeded,
    NoTopicsConfigured,
    TopicStore,
    Interrupted,
    Io,
}
