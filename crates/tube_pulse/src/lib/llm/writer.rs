use std::future::Future;

use serde::{Deserialize, Serialize};
use tube_datastore::Topic;

use crate::error::ServiceError;

/// Generates narration scripts for a topic.
///
/// Implementations own their transient-error handling; a returned error is
/// final for the current run.
pub trait ScriptWriter {
    fn generate(
        &self,
        topic: &Topic,
    ) -> impl Future<Output = Result<ScriptDraft, ServiceError>> + Send;
}

/// What the language model hands back, before word counting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptDraft {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
}

impl<T: ScriptWriter + Send + Sync> ScriptWriter for &T {
    async fn generate(&self, topic: &Topic) -> Result<ScriptDraft, ServiceError> {
        (**self).generate(topic).await
    }
}
