pub mod artifacts;
pub mod config;
mod error;
mod http;
mod llm;
pub mod media;
pub mod parser;
mod processor;
pub mod rotation;
pub mod stock;
pub mod tracing;
pub mod types;
pub mod upload;

pub use config::{LlmBackend, PipelineConfig, Settings};
pub use error::{Error, FailureKind, ServiceError};
pub use llm::openai;
pub use llm::{ScriptDraft, ScriptWriter, Synthesizer};
pub use media::{Composer, MediaProcessor, ThumbnailRenderer};
pub use processor::{
    builder::ContentPipelineBuilder, stages::visual_queries, ContentPipeline, PipelineOptions,
};
pub use stock::FootageSource;
pub use upload::VideoHost;
